use onmcp_crm::CrmError;
use onmcp_db::DbError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("CRM location page at offset {skip} failed: {source}")]
    Crm {
        skip: u64,
        #[source]
        source: CrmError,
    },

    #[error("location pagination exceeded {max_pages} pages")]
    PaginationLimit { max_pages: u32 },

    #[error("database error during sync: {0}")]
    Db(#[from] DbError),
}
