pub mod access;
pub mod models;
pub mod repository;
pub mod storage;
pub mod upload;

pub use access::{can_mutate, can_read};
pub use models::{
    File, FileFilter, FileResponse, FileType, InvalidIdentifier, ParentRef, UploadRequest,
    PAGE_SIZE,
};
pub use repository::{FileRepository, FileStore};
pub use storage::ContentStorage;
pub use upload::UploadService;
