// 50 Hz loop with watchdogs
//
// Each tick: drain IMU samples and commands, advance the orientation filter,
// then drive with heading hold. The robot is stopped whenever commands or IMU
// samples go stale, or when any stage fails.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::config::{
    CMD_TIMEOUT, IMU_TIMEOUT, LOOP_HZ, PlatformConfig, TOPIC_CMD_BASE, TOPIC_CMD_CALIBRATE,
    TOPIC_HEALTH, TOPIC_IMU, TOPIC_ORIENTATION,
};
use crate::error::{Error, Result};
use crate::messages::{BaseCommand, ImuSample, OrientationReport, RuntimeHealth};
use crate::motor::{
    FeetechBus, FeetechMotor, RangedSpeedController, SimulatedMotor, SpeedController, WheelDriver,
};
use crate::orientation::{Imu, OrientationEstimator, Vector3, YawSource};
use crate::platform::{GoCommand, GyroPidCalculator, GyroPlatform, Platform};
use crate::time::{MonotonicClock, TimeSource};

/// IMU view holding the most recent sample received over the network
#[derive(Debug, Default)]
pub struct LatestImu {
    sample: Option<ImuSample>,
}

impl LatestImu {
    pub fn push(&mut self, sample: ImuSample) {
        self.sample = Some(sample);
    }

    pub fn latest(&self) -> Option<ImuSample> {
        self.sample
    }

    fn get(&self) -> Result<ImuSample> {
        self.sample
            .ok_or_else(|| Error::InvalidResource("no IMU sample received yet".into()))
    }
}

impl Imu for LatestImu {
    fn angular_rate(&self) -> Result<Vector3> {
        Ok(self.get()?.angular_rate)
    }

    fn acceleration(&self) -> Result<Vector3> {
        Ok(self.get()?.acceleration)
    }
}

pub type Estimator = OrientationEstimator<LatestImu>;

/// Runtime wired to the Feetech bus (or its simulation) and the wall clock
pub type BaseRuntime = Runtime<RangedSpeedController<WheelDriver>, MonotonicClock>;

pub struct Runtime<C, T> {
    platform: GyroPlatform<C, Estimator, T>,
    latest_cmd: Option<BaseCommand>,
    cmd_received_at: f64,
    imu_received_at: Option<f64>,
    health: RuntimeHealth,
}

impl<C: SpeedController, T: TimeSource> Runtime<C, T> {
    pub fn new(platform: GyroPlatform<C, Estimator, T>) -> Self {
        Self {
            platform,
            latest_cmd: None,
            cmd_received_at: 0.0,
            imu_received_at: None,
            health: RuntimeHealth::CmdStale, // Start stale until first cmd
        }
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }

    pub fn platform(&self) -> &GyroPlatform<C, Estimator, T> {
        &self.platform
    }

    fn estimator(&self) -> &Estimator {
        self.platform.calculator().yaw_source()
    }

    fn estimator_mut(&mut self) -> &mut Estimator {
        self.platform.calculator_mut().yaw_source_mut()
    }

    fn now(&self) -> f64 {
        self.platform.clock().now()
    }

    pub fn on_command(&mut self, cmd: BaseCommand) {
        info!("Received command: {:?}", &cmd);
        self.latest_cmd = Some(cmd);
        self.cmd_received_at = self.now();
    }

    pub fn on_imu(&mut self, sample: ImuSample) {
        self.estimator_mut().sensor_mut().push(sample);
        self.imu_received_at = Some(self.now());
    }

    /// Re-zero the orientation and hold the resulting heading
    pub fn calibrate(&mut self) -> Result<()> {
        self.estimator_mut().calibrate()?;
        let yaw = self.estimator().yaw()?;
        self.platform.set_head(yaw);
        self.platform.calculator_mut().pid_mut().reset();
        Ok(())
    }

    pub fn report(&self) -> Result<OrientationReport> {
        Ok(OrientationReport {
            ypr: self.estimator().ypr()?,
            head: self.platform.head(),
        })
    }

    /// Run one control tick and return the resulting health
    pub fn step(&mut self) -> RuntimeHealth {
        let now = self.now();
        let health = self.evaluate(now);

        if health != self.health {
            match health {
                RuntimeHealth::Ok => info!("Runtime healthy, driving"),
                other => warn!("Runtime {:?}, robot stopped", other),
            }
        }
        self.health = health;
        health
    }

    fn evaluate(&mut self, now: f64) -> RuntimeHealth {
        let imu_fresh = self
            .imu_received_at
            .is_some_and(|at| now - at <= IMU_TIMEOUT.as_secs_f64());
        if !imu_fresh {
            // Integrating across the silence would invent a rotation on recovery
            self.estimator_mut().reset_history();
            self.halt();
            return RuntimeHealth::ImuStale;
        }

        if let Err(e) = self.estimator_mut().update(now) {
            warn!("Orientation update failed: {}", e);
            self.halt();
            return RuntimeHealth::Fault;
        }

        let cmd = match &self.latest_cmd {
            Some(cmd) if now - self.cmd_received_at <= CMD_TIMEOUT.as_secs_f64() => {
                GoCommand::from(cmd)
            }
            _ => {
                // Watchdog triggered or no command ever received
                self.halt();
                return RuntimeHealth::CmdStale;
            }
        };

        if cmd.angular_speed != 0.0 && !cmd.sync_head {
            // Operator is turning: hold whatever heading they end up on
            if let Ok(yaw) = self.estimator().yaw() {
                self.platform.set_head(yaw);
            }
        }

        match self.platform.go(&cmd) {
            Ok(()) => RuntimeHealth::Ok,
            Err(e) => {
                warn!("Drive failed: {}", e);
                self.halt();
                RuntimeHealth::Fault
            }
        }
    }

    fn halt(&mut self) {
        if let Err(e) = self.platform.stop() {
            warn!("Failed to stop motors: {}", e);
        }
    }
}

impl BaseRuntime {
    /// Open the motor bus (unless simulating) and assemble the heading-holding base
    pub fn assemble(config: &PlatformConfig, port: &str, simulate: bool) -> Result<Self> {
        let bus = if simulate {
            info!("Simulation mode: motors are not driven");
            None
        } else {
            info!("Opening motor bus on {}", port);
            Some(Rc::new(RefCell::new(FeetechBus::open(port)?)))
        };

        let mut platform = Platform::new(
            config.motors.clone(),
            config.parallelism_precision,
            |info| {
                let driver = match &bus {
                    Some(bus) => WheelDriver::Feetech(FeetechMotor::new(bus.clone())),
                    None => WheelDriver::Simulated(SimulatedMotor::default()),
                };
                RangedSpeedController::new(info, driver)
            },
        );
        platform.init(&config.motor_ids)?;

        let mut estimator = Estimator::with_acceleration(LatestImu::default());
        let (yaw, pitch, roll) = config.filter.axis_configs();
        estimator.init(yaw, pitch, roll);

        let calculator = GyroPidCalculator::new(config.heading_pid.regulator(), estimator);
        Ok(Self::new(GyroPlatform::new(
            platform,
            calculator,
            MonotonicClock::new(),
        )))
    }
}

pub async fn run(
    config: PlatformConfig,
    port: &str,
    simulate: bool,
) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut runtime = BaseRuntime::assemble(&config, port, simulate)?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    info!("Setting up publishers and subscribers...");
    let sub_cmd = session.declare_subscriber(TOPIC_CMD_BASE).await?;
    let sub_calibrate = session.declare_subscriber(TOPIC_CMD_CALIBRATE).await?;
    let sub_imu = session.declare_subscriber(TOPIC_IMU).await?;
    let pub_orientation = session.declare_publisher(TOPIC_ORIENTATION).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {}Hz loop, {}ms command timeout, {}ms IMU timeout",
        LOOP_HZ,
        CMD_TIMEOUT.as_millis(),
        IMU_TIMEOUT.as_millis()
    );
    info!(
        "Subscribed to: {}, {}, {}",
        TOPIC_CMD_BASE, TOPIC_CMD_CALIBRATE, TOPIC_IMU
    );
    info!("Publishing to: {}, {}", TOPIC_ORIENTATION, TOPIC_HEALTH);

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down, stopping motors");
                runtime.halt();
                return Ok(());
            }
        }

        // 1. Drain IMU samples, the newest one wins
        while let Ok(Some(sample)) = sub_imu.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<ImuSample>(&payload) {
                Ok(imu) => runtime.on_imu(imu),
                Err(e) => warn!("Failed to parse IMU sample: {}", e),
            }
        }

        // 2. Calibration requests carry no payload
        while let Ok(Some(_)) = sub_calibrate.try_recv() {
            match runtime.calibrate() {
                Ok(()) => info!("Orientation calibrated"),
                Err(e) => warn!("Calibration failed: {}", e),
            }
        }

        // 3. Drain all pending commands, keep latest
        while let Ok(Some(sample)) = sub_cmd.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<BaseCommand>(&payload) {
                Ok(cmd) => runtime.on_command(cmd),
                Err(e) => warn!("Failed to parse command: {}", e),
            }
        }

        // 4. Filter, watchdogs, drive
        let health = runtime.step();

        // 5. Publish orientation and health
        if let Ok(report) = runtime.report() {
            pub_orientation.put(serde_json::to_string(&report)?).await?;
        }
        pub_health.put(serde_json::to_string(&health)?).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::MotorInfo;
    use std::cell::Cell;

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<f64>>);

    impl ManualClock {
        fn set(&self, t: f64) {
            self.0.set(t);
        }
    }

    impl TimeSource for ManualClock {
        fn now(&self) -> f64 {
            self.0.get()
        }
    }

    type SimRuntime = Runtime<RangedSpeedController<SimulatedMotor>, ManualClock>;

    fn sim_runtime(faulty_wheel: Option<usize>) -> (SimRuntime, ManualClock) {
        let config = PlatformConfig::default();
        let mut index = 0;
        let platform = Platform::new(config.motors.clone(), 0, |info: MotorInfo| {
            let motor = if Some(index) == faulty_wheel {
                SimulatedMotor::faulty("overheated")
            } else {
                SimulatedMotor::default()
            };
            index += 1;
            RangedSpeedController::new(info, motor)
        });

        let mut estimator = Estimator::with_acceleration(LatestImu::default());
        let (yaw, pitch, roll) = config.filter.axis_configs();
        estimator.init(yaw, pitch, roll);

        let clock = ManualClock::default();
        let calculator = GyroPidCalculator::new(config.heading_pid.regulator(), estimator);
        let runtime = Runtime::new(GyroPlatform::new(platform, calculator, clock.clone()));
        (runtime, clock)
    }

    fn level(yaw_rate: f64) -> ImuSample {
        ImuSample {
            acceleration: [0.0, 0.0, 9.81],
            angular_rate: [yaw_rate, 0.0, 0.0],
        }
    }

    fn forward() -> BaseCommand {
        BaseCommand {
            speed: 0.1,
            angle: 30.0,
            angular_speed: 0.0,
            relative: false,
            sync_head: false,
            speed_k: 1.0,
        }
    }

    fn wheels(runtime: &SimRuntime) -> Vec<f64> {
        runtime
            .platform()
            .platform()
            .controllers()
            .iter()
            .map(|c| c.speed().unwrap())
            .collect()
    }

    #[test]
    fn test_no_imu_keeps_robot_stopped() {
        let (mut runtime, _clock) = sim_runtime(None);
        runtime.on_command(forward());

        assert_eq!(runtime.step(), RuntimeHealth::ImuStale);
        assert_eq!(wheels(&runtime), vec![0.0; 3]);
    }

    #[test]
    fn test_drives_with_fresh_inputs() {
        let (mut runtime, _clock) = sim_runtime(None);
        runtime.on_imu(level(0.0));
        runtime.on_command(forward());

        assert_eq!(runtime.step(), RuntimeHealth::Ok);
        // Travelling along the right wheel: it carries the full 0.1 / 0.05
        let speeds = wheels(&runtime);
        assert!((speeds[2] - 2.0).abs() < 1e-2, "right wheel was {}", speeds[2]);
    }

    #[test]
    fn test_stale_command_stops_robot() {
        let (mut runtime, clock) = sim_runtime(None);
        runtime.on_imu(level(0.0));
        runtime.on_command(forward());
        assert_eq!(runtime.step(), RuntimeHealth::Ok);

        clock.set(0.3);
        runtime.on_imu(level(0.0));
        assert_eq!(runtime.step(), RuntimeHealth::CmdStale);
        assert_eq!(wheels(&runtime), vec![0.0; 3]);
    }

    #[test]
    fn test_stale_imu_stops_robot() {
        let (mut runtime, clock) = sim_runtime(None);
        runtime.on_imu(level(0.0));
        runtime.on_command(forward());
        assert_eq!(runtime.step(), RuntimeHealth::Ok);

        clock.set(0.3);
        runtime.on_command(forward());
        assert_eq!(runtime.step(), RuntimeHealth::ImuStale);
        assert_eq!(wheels(&runtime), vec![0.0; 3]);
    }

    #[test]
    fn test_motor_fault_is_reported() {
        let (mut runtime, _clock) = sim_runtime(Some(1));
        runtime.on_imu(level(0.0));
        runtime.on_command(forward());

        assert_eq!(runtime.step(), RuntimeHealth::Fault);
        assert_eq!(runtime.health(), RuntimeHealth::Fault);
    }

    #[test]
    fn test_imu_gap_does_not_jump_yaw() {
        let (mut runtime, clock) = sim_runtime(None);
        runtime.on_imu(level(30.0));
        runtime.step();

        clock.set(3.0);
        assert_eq!(runtime.step(), RuntimeHealth::ImuStale);

        runtime.on_imu(level(0.0));
        runtime.step();
        assert_eq!(runtime.report().unwrap().ypr.yaw, 0.0);
    }

    #[test]
    fn test_manual_turn_moves_held_heading() {
        let (mut runtime, clock) = sim_runtime(None);
        runtime.on_imu(level(10.0));
        runtime.step();

        clock.set(0.2);
        runtime.on_imu(level(10.0));
        runtime.on_command(BaseCommand {
            angular_speed: 0.5,
            ..forward()
        });
        assert_eq!(runtime.step(), RuntimeHealth::Ok);
        assert!((runtime.report().unwrap().head - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_yaw_integrates_and_calibrate_rezeroes() {
        let (mut runtime, clock) = sim_runtime(None);
        runtime.on_imu(level(10.0));
        runtime.step();

        clock.set(0.2);
        runtime.on_imu(level(10.0));
        runtime.step();

        let report = runtime.report().unwrap();
        assert!((report.ypr.yaw - 2.0).abs() < 1e-9, "yaw was {}", report.ypr.yaw);

        runtime.calibrate().unwrap();
        let report = runtime.report().unwrap();
        assert_eq!(report.ypr.yaw, 0.0);
        assert_eq!(report.head, 0.0);
    }
}
