use utoipa::OpenApi;

pub(crate) const OAUTH_TAG: &str = "OAuth2 API";

#[derive(OpenApi)]
#[openapi(
    tags(
        (name = OAUTH_TAG, description = "Token issuance and authorization endpoints"),
    ),
    info(
        title = "Authorization Server API",
        description = "OAuth2 authorization server: password and refresh_token grants, browser login and authorization redirect",
        version = "0.1.0"
    )
)]
pub(crate) struct ApiDoc;
