use utoipa::OpenApi;

pub const PLATFORM_TAG: &str = "Platforms";
pub const BOARD_TAG: &str = "Boards";
pub const SETTING_TAG: &str = "Settings";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "asmblive",
        description = "Local API for resolving live rooms and proxying their resources",
    ),
    components(
        schemas(
            crate::api::dto::ErrorResponse,
        )
    ),
    tags(
        (name = PLATFORM_TAG, description = "Platform, room and stream resolution endpoints"),
        (name = BOARD_TAG, description = "Saved board endpoints"),
        (name = SETTING_TAG, description = "Settings endpoints"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
