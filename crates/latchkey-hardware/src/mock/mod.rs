//! Mock device implementations for testing and simulation.
//!
//! Each mock is created together with a handle. The device half is handed to
//! a device loop while the handle drives inputs or observes outputs from a
//! test or the simulator.

pub mod indicator;
pub mod matrix;
pub mod rfid;
pub mod sensor;

pub use indicator::{MockIndicatorHandle, MockIndicatorPin};
pub use matrix::{MockKeyMatrix, MockKeyMatrixHandle};
pub use rfid::{FixedSerial, MockCardReader, MockCardReaderHandle};
pub use sensor::{MockContactSensor, MockContactSensorHandle};
