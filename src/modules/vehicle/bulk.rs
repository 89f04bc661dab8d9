use super::model::{validate_vehicle, Vehicle, WriteOperation};
use super::repository::{RepositoryError, VehicleRepository};
use crate::modules::auth::jwt::AuthInfo;
use crate::modules::common::responses::{ApiError, ApiErrorKind, BulkResponse, FailureDetails};
use http::StatusCode;
use tracing::error;

/// Applies a bulk register or update, item by item in input order, and
/// aggregates the outcomes into a single response.
///
/// an item that fails validation never reaches storage, every failure entry
/// carries the submitted item unchanged. The overall status is 500 only when
/// every item failed for server side reasons, 400 when nothing succeeded but
/// at least one failure was the client's fault, and the operation's success
/// status otherwise (also for an empty batch)
pub async fn apply(
    repository: &dyn VehicleRepository,
    auth: AuthInfo,
    operation: WriteOperation,
    vehicles: Vec<Vehicle>,
) -> (StatusCode, BulkResponse<Vehicle>) {
    let mut response = BulkResponse::with_total(vehicles.len());
    let mut server_errors = 0;

    for vehicle in vehicles {
        let errors = validate_vehicle(&vehicle, auth.provider_id, operation);
        if !errors.is_empty() {
            response.failures.push(FailureDetails {
                item: vehicle,
                error: ApiError::bad_param(errors),
            });
            continue;
        }

        let result = match operation {
            WriteOperation::Register => repository.insert_vehicle(&vehicle).await,
            WriteOperation::Update => repository.update_vehicle(&vehicle).await,
        };

        match (operation, result) {
            (_, Ok(())) => response.success += 1,

            (WriteOperation::Register, Err(RepositoryError::Conflict)) => {
                response.failures.push(FailureDetails {
                    item: vehicle,
                    error: ApiError::new(ApiErrorKind::AlreadyRegistered),
                });
            }

            (WriteOperation::Update, Err(RepositoryError::NotFound)) => {
                response.failures.push(FailureDetails {
                    item: vehicle,
                    error: ApiError::new(ApiErrorKind::Unregistered),
                });
            }

            (_, Err(err)) => {
                match operation {
                    WriteOperation::Register => error!("failed to insert vehicle: {err:#}"),
                    WriteOperation::Update => error!("failed to update vehicle: {err:#}"),
                }
                server_errors += 1;
                response.failures.push(FailureDetails {
                    item: vehicle,
                    error: ApiError::new(ApiErrorKind::Unknown),
                });
            }
        }
    }

    let status = if response.total > 0 && server_errors == response.total {
        StatusCode::INTERNAL_SERVER_ERROR
    } else if response.total > 0 && response.success == 0 {
        StatusCode::BAD_REQUEST
    } else {
        match operation {
            WriteOperation::Register => StatusCode::CREATED,
            WriteOperation::Update => StatusCode::OK,
        }
    };

    (status, response)
}
