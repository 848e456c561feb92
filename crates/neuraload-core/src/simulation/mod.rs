//! Simulated sensor acquisition
//!
//! Stands in for the real inertial, ranging and load-cell hardware by
//! publishing random readings into a `SensorStore` at a fixed rate.

pub mod random;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::payload::{ImuReading, IMU_SENSOR_COUNT, RANGING_SENSOR_COUNT};
use crate::sensor::{SensorReadings, SensorStore};

pub use random::{RandomSource, SeededRandom, SystemRandom};

// ----------------------------------------------------------------------------
// Value Ranges
// ----------------------------------------------------------------------------

pub const ACCEL_XY_RANGE: (f32, f32) = (-1.0, 1.0);
/// Roughly gravity on the vertical axis
pub const ACCEL_Z_RANGE: (f32, f32) = (9.5, 9.8);
pub const GYRO_RANGE: (f32, f32) = (-0.1, 0.1);
pub const MAG_RANGE: (f32, f32) = (-50.0, 50.0);
/// Metres
pub const RANGING_RANGE: (f32, f32) = (0.5, 5.0);
/// Kilograms
pub const WEIGHT_RANGE: (f32, f32) = (50.0, 100.0);

// ----------------------------------------------------------------------------
// Simulator
// ----------------------------------------------------------------------------

/// Generates plausible random sensor readings
pub struct SensorSimulator {
    rng: Box<dyn RandomSource>,
}

impl SensorSimulator {
    pub fn new(rng: Box<dyn RandomSource>) -> Self {
        Self { rng }
    }

    pub fn from_entropy() -> Self {
        Self::new(Box::new(SystemRandom::new()))
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(Box::new(SeededRandom::new(seed)))
    }

    fn draw(&mut self, (low, high): (f32, f32)) -> f32 {
        self.rng.gen_range_f32(low, high)
    }

    fn next_imu(&mut self) -> ImuReading {
        ImuReading {
            accel: [
                self.draw(ACCEL_XY_RANGE),
                self.draw(ACCEL_XY_RANGE),
                self.draw(ACCEL_Z_RANGE),
            ],
            gyro: [
                self.draw(GYRO_RANGE),
                self.draw(GYRO_RANGE),
                self.draw(GYRO_RANGE),
            ],
            mag: [
                self.draw(MAG_RANGE),
                self.draw(MAG_RANGE),
                self.draw(MAG_RANGE),
            ],
        }
    }

    /// Draw one complete set of readings
    pub fn next_readings(&mut self) -> SensorReadings {
        let mut imu = [ImuReading::default(); IMU_SENSOR_COUNT];
        for reading in imu.iter_mut() {
            *reading = self.next_imu();
        }

        let mut ranging = [0.0f32; RANGING_SENSOR_COUNT];
        for distance in ranging.iter_mut() {
            *distance = self.draw(RANGING_RANGE);
        }

        SensorReadings {
            imu,
            ranging,
            weight: self.draw(WEIGHT_RANGE),
        }
    }
}

// ----------------------------------------------------------------------------
// Updater Task
// ----------------------------------------------------------------------------

/// Background task publishing simulated readings
pub struct SensorUpdater {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SensorUpdater {
    /// Publish one set of readings immediately, then one every `period`
    pub fn spawn(store: Arc<SensorStore>, mut simulator: SensorSimulator, period: Duration) -> Self {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            info!("Sensor simulator publishing every {}ms", period.as_millis());
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        store.publish(simulator.next_readings()).await;
                        debug!("Published simulated sensor readings");
                    }
                }
            }

            debug!("Sensor simulator stopped");
        });

        Self {
            stop_tx: Some(stop_tx),
            task,
        }
    }

    pub async fn stop(mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("Sensor simulator task ended abnormally: {}", e);
        }
    }
}

impl Drop for SensorUpdater {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within((low, high): (f32, f32), value: f32) -> bool {
        value >= low && value < high
    }

    #[test]
    fn test_readings_stay_in_reference_ranges() {
        let mut simulator = SensorSimulator::seeded(7);
        for _ in 0..200 {
            let readings = simulator.next_readings();
            for imu in &readings.imu {
                assert!(within(ACCEL_XY_RANGE, imu.accel[0]));
                assert!(within(ACCEL_XY_RANGE, imu.accel[1]));
                assert!(within(ACCEL_Z_RANGE, imu.accel[2]));
                assert!(imu.gyro.iter().all(|g| within(GYRO_RANGE, *g)));
                assert!(imu.mag.iter().all(|m| within(MAG_RANGE, *m)));
            }
            assert!(readings.ranging.iter().all(|d| within(RANGING_RANGE, *d)));
            assert!(within(WEIGHT_RANGE, readings.weight));
        }
    }

    #[test]
    fn test_seeded_simulators_agree() {
        let mut a = SensorSimulator::seeded(42);
        let mut b = SensorSimulator::seeded(42);
        assert_eq!(a.next_readings(), b.next_readings());
    }

    #[tokio::test(start_paused = true)]
    async fn test_updater_publishes_on_cadence() {
        let store = Arc::new(SensorStore::new("NL-SIM"));
        let updater = SensorUpdater::spawn(
            store.clone(),
            SensorSimulator::seeded(1),
            Duration::from_secs(1),
        );

        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert_eq!(store.revision().await, 3);

        updater.stop().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(store.revision().await, 3);
    }
}
