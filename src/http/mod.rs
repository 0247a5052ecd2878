//! HTTP surface of the task store.
//!
//! | Route | Handler |
//! |---|---|
//! | `GET /api/health` | liveness probe |
//! | `GET /api/tarefas` | list in presentation order |
//! | `POST /api/tarefas` | create |
//! | `PUT /api/tarefas/{id}` | update name, cost and due date |
//! | `DELETE /api/tarefas/{id}` | delete |
//! | `PATCH /api/tarefas/{id}/mover` | move `up` or `down` |

mod dto;
mod error;
mod handlers;
mod routes;

pub use dto::{
    ErrorResponse, HealthResponse, MoveResponse, SuccessResponse, TaskResponse,
    ValidationErrorResponse,
};
pub use error::{ApiError, INTERNAL_ERROR_MESSAGE, INVALID_DIRECTION_MESSAGE, NOT_FOUND_MESSAGE};
pub use handlers::ApiResult;
pub use routes::{cors_layer, router};
