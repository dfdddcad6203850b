mod error;
mod handlers;
mod planner;
mod pose_store;
mod remote;
mod serializer;
mod server;
mod stage_planner;
mod visualization;

#[cfg(test)]
mod testing;

use binpicking_lib::{
    init_tracing, install_thread_dispatch, release_thread_dispatch, tracing_dispatch,
    EmulatorConfig, ForwardKinematics,
};
use dora_node_api::{arrow::array::BinaryArray, dora_core::config::DataId, DoraNode, Event};
use eyre::Result;
use handlers::Emulator;
use pose_store::PoseStore;
use remote::{ZenohPlanner, ZenohPoseSource};
use stage_planner::{StagePlanner, StageSettings};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use visualization::{pace_markers, MarkerPublisher, NullSink, TrajectorySink};
use zenoh::{Config, Session};

fn main() -> Result<()> {
    let _guard = init_tracing();

    info!("Starting bin picking emulator");

    let config_path = std::env::var("EMULATOR_CONFIG")
        .unwrap_or_else(|_| "config/binpicking_emulator.toml".to_string());
    let config = EmulatorConfig::load_or_default(&config_path)?;
    config.validate()?;

    info!(
        "Robot: {} joints, planning group {}, grasp path {:?}",
        config.robot.num_of_joints, config.robot.planning_group, config.planner.grasp_path
    );

    let dispatch = tracing_dispatch();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.startup.worker_threads)
        .enable_all()
        .on_thread_start(move || install_thread_dispatch(&dispatch))
        .on_thread_stop(release_thread_dispatch)
        .build()
        .map_err(|e| eyre::eyre!("Failed to build runtime: {}", e))?;

    runtime.block_on(run(config))
}

async fn run(config: EmulatorConfig) -> Result<()> {
    let (mut node, mut events) = DoraNode::init_from_env()?;
    let markers_output = DataId::from("trajectory_markers".to_owned());

    let session = open_zenoh_session().await?;
    info!("Zenoh session ID: {}", session.zid());

    let initial_delay = Duration::from_millis(config.startup.initial_delay_ms);
    if !initial_delay.is_zero() {
        info!("Waiting {:?} before looking for collaborators", initial_delay);
        tokio::time::sleep(initial_delay).await;
    }

    if config.startup.wait_for_dependencies {
        let dependencies = [
            config.services.planner_prefix.clone(),
            config.services.bin_pose.clone(),
        ];
        info!("Waiting for {}", dependencies.join(", "));
        remote::wait_for_dependencies(
            &session,
            &dependencies,
            Duration::from_millis(config.startup.poll_interval_ms),
        )
        .await;
    }

    let pose_store = Arc::new(PoseStore::new(config.robot.num_of_joints));

    let (marker_tx, marker_rx) = flume::unbounded();
    let sink: Arc<dyn TrajectorySink> = if config.visualization.enabled {
        let kinematics = ForwardKinematics::new(&config.kinematics);
        info!(
            "Publishing trajectory markers on {} with {}-joint kinematics",
            config.visualization.frame_id,
            kinematics.dof()
        );
        let (publisher, batches) = MarkerPublisher::new(kinematics, config.visualization.clone());
        tokio::spawn(pace_markers(
            batches,
            marker_tx,
            Duration::from_millis(config.visualization.pacing_ms),
        ));
        Arc::new(publisher)
    } else {
        info!("Trajectory visualization disabled");
        Arc::new(NullSink)
    };

    let stage_planner = StagePlanner::new(
        ZenohPlanner::new(session.clone(), &config),
        ZenohPoseSource::new(session.clone(), &config),
        pose_store.clone(),
        sink,
        StageSettings::from(&config.planner),
    );
    let emulator = Arc::new(Emulator::new(
        stage_planner,
        pose_store,
        config.delays.clone(),
        config.planner.emit_info_records,
    ));

    let services = server::serve(&session, emulator, &config).await?;

    let _token = session
        .liveliness()
        .declare_token(config.services.prefix.as_str())
        .await
        .map_err(|e| eyre::eyre!("Failed to declare liveliness token: {}", e))?;

    info!("Ready");

    // Bridge dora's blocking event stream into the async loop
    let (dora_tx, dora_rx) = flume::unbounded();
    std::thread::spawn(move || {
        while let Some(event) = events.recv() {
            if dora_tx.send(event).is_err() {
                break;
            }
        }
    });

    let mut marker_count: u64 = 0;

    loop {
        tokio::select! {
            Ok(event) = dora_rx.recv_async() => {
                match event {
                    Event::Stop(_) => {
                        info!("Stop signal received");
                        break;
                    }
                    Event::Input { id, .. } => debug!("Ignoring input {}", id),
                    _ => {}
                }
            }

            Ok(marker) = marker_rx.recv_async() => {
                match serde_json::to_vec(&marker) {
                    Ok(bytes) => {
                        let data = BinaryArray::from_vec(vec![bytes.as_slice()]);
                        match node.send_output(markers_output.clone(), Default::default(), data) {
                            Ok(()) => marker_count += 1,
                            Err(e) => warn!("Failed to send trajectory marker: {}", e),
                        }
                    }
                    Err(e) => warn!("Failed to serialize trajectory marker: {}", e),
                }
            }

            else => break,
        }
    }

    for task in services {
        task.abort();
    }

    info!(
        "Bin picking emulator stopped, {} trajectory markers published",
        marker_count
    );

    Ok(())
}

async fn open_zenoh_session() -> Result<Session> {
    let config_path = std::env::var("ZENOH_CONFIG")
        .unwrap_or_else(|_| "config/zenoh_config.json5".to_string());

    let config = if std::path::Path::new(&config_path).exists() {
        info!("Loading Zenoh config from: {}", config_path);
        Config::from_file(&config_path)
            .map_err(|e| eyre::eyre!("Failed to load Zenoh config from {}: {}", config_path, e))?
    } else {
        warn!("Zenoh config not found at {}, using peer mode", config_path);
        let mut config = Config::default();
        config
            .insert_json5("mode", "\"peer\"")
            .map_err(|e| eyre::eyre!("Failed to set Zenoh mode: {}", e))?;
        config
    };

    zenoh::open(config)
        .await
        .map_err(|e| eyre::eyre!("Failed to open Zenoh session: {}", e))
}
