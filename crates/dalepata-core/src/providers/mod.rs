// Adoption request sources backed by real services
pub mod dalepata;

pub use dalepata::RemoteRequestSource;
