//! OpenClaw responder client: trait seam, HTTP implementation, test mock.

pub mod http;
pub mod mock;
pub mod traits;

pub use http::{extract_response_text, OpenClawClient};
pub use mock::MockOpenClaw;
pub use traits::{OpenClawApi, OpenClawResponse};
