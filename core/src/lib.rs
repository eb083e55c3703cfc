pub mod patcher;
pub mod pattern;
pub mod resolver;
pub mod runner;

pub use patcher::{FilePatcher, PatchResult};
pub use pattern::EndpointPattern;
pub use resolver::{AddressResolver, FixedResolver, Resolution, RouteProbeResolver};
pub use runner::{PropagationRunner, RunReport};
