mod error;
mod http_mapping;
mod keys;
mod pagination;
mod traits;

pub use error::{KeyError, Result, StoreError};
pub use http_mapping::store_error_to_status_code;
pub use keys::{
    decode_sort_key, encode_key, partition_key, sort_key, validate_local_id, StorageKey,
    KEY_DELIMITER, ROOT_PARTITION,
};
pub use pagination::{decode_cursor, encode_cursor, Page, PageRequest, PageSize, ResumePoint};
pub use traits::{EntityStore, IdentityIndex};
