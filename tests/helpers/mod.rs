// Test helper modules
pub mod embedders;
pub mod scripted_store;
pub mod test_harness;

pub use embedders::{CountingEmbedder, EmptyEmbedder, FailingEmbedder, SlowEmbedder};
pub use scripted_store::{artifact, hit, ScriptedStore};
pub use test_harness::TestHarness;
