/*!
# Meterlink DevKit - test doubles and fixtures

Helpers for exercising the Home Assistant publisher without a broker:
- `MockTransport` records every publication instead of sending it
- `ManualClock` gives tests full control of wall-clock and uptime
- Fixtures for readings of every tier, accounting, prices and probes
- `TestHarness` wiring all of the above around a publisher
*/

pub mod clock;
pub mod fixtures;
pub mod mock_transport;
pub mod test_utils;

pub use clock::ManualClock;
pub use mock_transport::{MockMessage, MockTransport};
pub use test_utils::TestHarness;
