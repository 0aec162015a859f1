use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use bevy::math::Vec2;
use work_engine::{
    build_headless_app, AgentDef, AgentId, AgentState, CandidateSource, DefId, MapId,
    ReservationService, TargetId, TargetRef, TaskFactory, TaskHandle, WorkCategory, WorldServices,
};

static DIAGNOSTICS: Once = Once::new();

/// Route engine diagnostics through the test harness. Filter with e.g.
/// `RUST_LOG=work_engine::assign=debug` when a test needs the per-tick
/// assignment trace.
pub fn init_diagnostics() {
    DIAGNOSTICS.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

/// Candidate source backed by a shared, mutable target list so tests can
/// edit the world between ticks and count enumeration scans.
pub struct StubWorld {
    targets: Arc<Mutex<Vec<TargetRef>>>,
    enumerations: Arc<AtomicUsize>,
}

impl CandidateSource for StubWorld {
    fn enumerate(&self, _map: MapId) -> Vec<TargetRef> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().clone()
    }
}

pub struct OpenReservations;

impl ReservationService for OpenReservations {
    fn can_reserve_and_reach(&self, _agent: &AgentState, _target: &TargetRef) -> bool {
        true
    }
}

/// Factory that records every created handle for later inspection.
pub struct RecordingFactory {
    created: Arc<Mutex<Vec<TaskHandle>>>,
}

impl TaskFactory for RecordingFactory {
    fn create(
        &mut self,
        category: WorkCategory,
        agent: AgentId,
        target: TargetId,
    ) -> Option<TaskHandle> {
        let handle = TaskHandle {
            category,
            agent,
            target,
        };
        self.created.lock().unwrap().push(handle);
        Some(handle)
    }
}

/// Shared handles into the stub world, kept by the test after the services
/// move into the app.
pub struct WorldProbe {
    pub targets: Arc<Mutex<Vec<TargetRef>>>,
    pub enumerations: Arc<AtomicUsize>,
    pub created: Arc<Mutex<Vec<TaskHandle>>>,
}

pub fn stub_services(initial_targets: Vec<TargetRef>) -> (WorldServices, WorldProbe) {
    init_diagnostics();
    let targets = Arc::new(Mutex::new(initial_targets));
    let enumerations = Arc::new(AtomicUsize::new(0));
    let created = Arc::new(Mutex::new(Vec::new()));
    let services = WorldServices::new(
        StubWorld {
            targets: Arc::clone(&targets),
            enumerations: Arc::clone(&enumerations),
        },
        OpenReservations,
        RecordingFactory {
            created: Arc::clone(&created),
        },
    );
    (
        services,
        WorldProbe {
            targets,
            enumerations,
            created,
        },
    )
}

pub fn spawn_colonists(app: &mut bevy::app::App, count: u32) {
    let mut registry = app
        .world
        .resource_mut::<work_engine::AgentRegistry>();
    registry.register_def(AgentDef::new("colonist", work_engine::AgentRole::Colonist));
    for i in 0..count {
        registry.spawn(AgentState::new(
            AgentId(i),
            DefId::new("colonist"),
            MapId(0),
            Vec2::new(i as f32, 0.0),
        ));
    }
}

pub fn haul_target(id: u64, x: f32) -> TargetRef {
    TargetRef::new(TargetId(id), Vec2::new(x, 0.0)).with_designation(WorkCategory::Hauling)
}

pub fn app_with_targets(
    targets: Vec<TargetRef>,
    colonists: u32,
) -> (bevy::app::App, WorldProbe) {
    let (services, probe) = stub_services(targets);
    let mut app = build_headless_app(services);
    spawn_colonists(&mut app, colonists);
    (app, probe)
}
