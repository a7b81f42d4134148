//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError` from `submit_core::storage`. Every
//! backend or transport failure becomes `StoreUnavailable`; the retry
//! decorator decides what to do with it.

use std::fmt::Debug;

use aws_sdk_dynamodb::error::SdkError;
use aws_sdk_dynamodb::operation::delete_item::DeleteItemError;
use aws_sdk_dynamodb::operation::get_item::GetItemError;
use aws_sdk_dynamodb::operation::put_item::PutItemError;
use aws_sdk_dynamodb::operation::query::QueryError;
use aws_sdk_dynamodb::operation::scan::ScanError;
use submit_core::storage::StoreError;

fn unavailable(message: impl Into<String>) -> StoreError {
    StoreError::StoreUnavailable(message.into())
}

/// Map a GetItem SDK error to StoreError.
pub fn map_get_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<GetItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        GetItemError::ResourceNotFoundException(_) => unavailable("Table not found"),
        GetItemError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        GetItemError::RequestLimitExceeded(_) => unavailable("Request limit exceeded, please retry"),
        GetItemError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => unavailable(format!("GetItem failed: {:?}", err)),
    }
}

/// Map a PutItem SDK error to StoreError.
pub fn map_put_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<PutItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        PutItemError::ResourceNotFoundException(_) => unavailable("Table not found"),
        PutItemError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        PutItemError::RequestLimitExceeded(_) => unavailable("Request limit exceeded, please retry"),
        PutItemError::ItemCollectionSizeLimitExceededException(_) => {
            unavailable("Item collection size limit exceeded")
        }
        PutItemError::TransactionConflictException(_) => {
            unavailable("Transaction conflict, please retry")
        }
        PutItemError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => unavailable(format!("PutItem failed: {:?}", err)),
    }
}

/// Map a Query SDK error to StoreError.
pub fn map_query_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<QueryError, R>,
) -> StoreError {
    match err.into_service_error() {
        QueryError::ResourceNotFoundException(_) => unavailable("Table or index not found"),
        QueryError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        QueryError::RequestLimitExceeded(_) => unavailable("Request limit exceeded, please retry"),
        QueryError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => unavailable(format!("Query failed: {:?}", err)),
    }
}

/// Map a Scan SDK error to StoreError.
pub fn map_scan_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<ScanError, R>,
) -> StoreError {
    match err.into_service_error() {
        ScanError::ResourceNotFoundException(_) => unavailable("Table not found"),
        ScanError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        ScanError::RequestLimitExceeded(_) => unavailable("Request limit exceeded, please retry"),
        ScanError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => unavailable(format!("Scan failed: {:?}", err)),
    }
}

/// Map a DeleteItem SDK error to StoreError.
pub fn map_delete_item_error<R: Debug + Send + Sync + 'static>(
    err: SdkError<DeleteItemError, R>,
) -> StoreError {
    match err.into_service_error() {
        DeleteItemError::ResourceNotFoundException(_) => unavailable("Table not found"),
        DeleteItemError::ProvisionedThroughputExceededException(_) => {
            unavailable("Throughput exceeded, please retry")
        }
        DeleteItemError::RequestLimitExceeded(_) => {
            unavailable("Request limit exceeded, please retry")
        }
        DeleteItemError::ItemCollectionSizeLimitExceededException(_) => {
            unavailable("Item collection size limit exceeded")
        }
        DeleteItemError::TransactionConflictException(_) => {
            unavailable("Transaction conflict, please retry")
        }
        DeleteItemError::InternalServerError(_) => unavailable("DynamoDB internal server error"),
        err => unavailable(format!("DeleteItem failed: {:?}", err)),
    }
}
