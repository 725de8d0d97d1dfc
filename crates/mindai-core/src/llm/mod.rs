mod traits;
mod claude;
mod gemini;
mod openai;
pub mod provider;
pub mod router;
pub mod transport;

pub use traits::*;
pub use claude::ClaudeAdapter;
pub use gemini::GeminiAdapter;
pub use openai::OpenAiCompatAdapter;
pub use provider::{ProviderConfig, ProviderId, ProviderRegistry};
pub use router::{ProviderRouter, RouteClass, RoutingRules};
pub use transport::{dispatch, HttpTransport, ReqwestTransport, TransportError};
