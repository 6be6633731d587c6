pub mod flow;
pub mod poller;

pub use flow::{CvFile, ScreeningFlow};
pub use poller::{JobPoller, PollPolicy};
