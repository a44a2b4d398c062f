pub mod paddle;

pub use paddle::{PaddleClient, PaddleWebhookEvent};
