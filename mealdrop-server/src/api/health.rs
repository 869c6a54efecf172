use shared::error::ApiResponse;

pub async fn health() -> ApiResponse<()> {
    ApiResponse::ok()
}
