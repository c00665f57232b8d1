pub mod document;
pub mod health;
pub mod loaders;
pub mod query;
pub mod remote;
pub mod upload;

pub use document::{DocumentFile, DocumentKind};
pub use health::HealthState;
pub use loaders::{load_document_file, load_documents_from_folder};
pub use query::{Citation, QueryOptions, QueryResponse, QuerySession, QueryState};
pub use remote::{
    DocumentListing, DocumentSummary, ProcessingStatus, RemoteStatus, UploadReceipt,
};
pub use upload::{PollPolicy, TaskId, UploadEvent, UploadStatus, UploadTask};
