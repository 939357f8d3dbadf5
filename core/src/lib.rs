//! ShopLens core: point a camera (or a photo) at a product, identify it via
//! a remote vision service, and present a purchase-oriented result.
//!
//! The crate is organized around one scan attempt: a [`CaptureSource`]
//! supplies a frame, the [`IdentifyClient`] performs a single remote call,
//! the [`ProgressSimulator`] drives cosmetic feedback concurrently, and the
//! [`ScanOrchestrator`] reconciles the outcome with the [`FallbackCatalog`]
//! into a terminal [`ScanPhase`]. Presentation layers consume the phase and
//! progress feeds; the core exposes no other output channel.

pub mod capture;
pub mod catalog;
pub mod credential;
pub mod identify;
pub mod progress;
pub mod scan;
pub mod shopping;

pub use capture::CaptureError;
pub use capture::CaptureSource;
pub use capture::CapturedImage;
pub use capture::ImagePurpose;
pub use catalog::CatalogEntry;
pub use catalog::FallbackCatalog;
pub use credential::CREDENTIAL_ENV_VAR;
pub use credential::Credential;
pub use credential::CredentialSource;
pub use identify::IdentificationOutcome;
pub use identify::IdentifyClient;
pub use identify::IdentifyFailure;
pub use identify::ProductIdentification;
pub use progress::ProgressHandle;
pub use progress::ProgressSimulator;
pub use scan::ImageRef;
pub use scan::Remediation;
pub use scan::ScanError;
pub use scan::ScanOrchestrator;
pub use scan::ScanPhase;
pub use scan::ScanResult;
pub use shopping::ShoppingLink;
pub use shopping::shopping_links;
