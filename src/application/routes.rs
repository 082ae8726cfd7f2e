use super::views;
use crate::{
    domain::Member,
    repository::{MemberRepository, RepositoryError},
};
use serde::{Deserialize, Serialize};
use std::{convert::Infallible, sync::Arc};
use tracing::{error, instrument};
use warp::{http::StatusCode, reject::Reject, Filter, Rejection, Reply};

pub type SharedRepository = Arc<dyn MemberRepository>;

const GREETING: &str = "헬로!!!";

/// Largest accepted body for member creation.
pub const MAX_BODY_BYTES: u64 = 1024 * 16;

#[derive(Debug, Deserialize)]
struct OptionalName {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RequiredName {
    name: String,
}

#[derive(Debug, Serialize)]
struct Hello {
    name: String,
}

#[derive(Debug, Deserialize)]
struct NewMember {
    name: String,
}

#[derive(Debug, Serialize)]
struct ErrorMessage {
    code: u16,
    message: String,
}

#[derive(Debug)]
struct RepositoryFailure(RepositoryError);

impl Reject for RepositoryFailure {}

fn reject_failure(e: RepositoryError) -> Rejection {
    warp::reject::custom(RepositoryFailure(e))
}

fn error_reply(code: StatusCode, message: String) -> warp::reply::Response {
    let body = ErrorMessage {
        code: code.as_u16(),
        message,
    };
    warp::reply::with_status(warp::reply::json(&body), code).into_response()
}

fn with_repository(
    repository: SharedRepository,
) -> impl Filter<Extract = (SharedRepository,), Error = Infallible> + Clone {
    warp::any().map(move || repository.clone())
}

/// Every route the application serves, with rejections turned into replies.
pub fn routes(
    repository: SharedRepository,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    greetings()
        .or(members(repository))
        .with(warp::trace::request())
        .recover(handle_rejection)
}

fn greetings() -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let hello = warp::path!("hello")
        .and(warp::get())
        .map(|| warp::reply::html(views::hello(GREETING)));

    let hello_mvc = warp::path!("hello-mvc")
        .and(warp::get())
        .and(warp::query::<OptionalName>())
        .map(|q: OptionalName| warp::reply::html(views::hello_template(q.name.as_deref())));

    let hello_string = warp::path!("hello-string")
        .and(warp::get())
        .and(warp::query::<RequiredName>())
        .map(|q: RequiredName| format!("hello {}", q.name));

    let hello_api = warp::path!("hello-api")
        .and(warp::get())
        .and(warp::query::<RequiredName>())
        .map(|q: RequiredName| warp::reply::json(&Hello { name: q.name }));

    hello.or(hello_mvc).or(hello_string).or(hello_api)
}

fn members(
    repository: SharedRepository,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let create = warp::path!("members")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<NewMember>())
        .and(with_repository(repository.clone()))
        .and_then(create_member);

    let list = warp::path!("members")
        .and(warp::get())
        .and(with_repository(repository.clone()))
        .and_then(list_members);

    let search = warp::path!("members" / "search")
        .and(warp::get())
        .and(warp::query::<RequiredName>())
        .and(with_repository(repository.clone()))
        .and_then(search_member);

    let by_id = warp::path!("members" / u64)
        .and(warp::get())
        .and(with_repository(repository))
        .and_then(get_member);

    create.or(list).or(search).or(by_id)
}

#[instrument(skip(repository))]
async fn create_member(
    body: NewMember,
    repository: SharedRepository,
) -> Result<impl Reply, Rejection> {
    let member = repository
        .save(Member::new(body.name))
        .await
        .map_err(reject_failure)?;
    Ok(warp::reply::with_status(
        warp::reply::json(&member),
        StatusCode::CREATED,
    ))
}

async fn list_members(repository: SharedRepository) -> Result<impl Reply, Rejection> {
    let members = repository.find_all().await.map_err(reject_failure)?;
    Ok(warp::reply::json(&members))
}

#[instrument(skip(repository))]
async fn search_member(
    q: RequiredName,
    repository: SharedRepository,
) -> Result<warp::reply::Response, Rejection> {
    match repository
        .find_by_name(&q.name)
        .await
        .map_err(reject_failure)?
    {
        Some(m) => Ok(warp::reply::json(&m).into_response()),
        None => Ok(error_reply(
            StatusCode::NOT_FOUND,
            format!("no member named {}", q.name),
        )),
    }
}

#[instrument(skip(repository))]
async fn get_member(
    id: u64,
    repository: SharedRepository,
) -> Result<warp::reply::Response, Rejection> {
    match repository.find_by_id(id).await.map_err(reject_failure)? {
        Some(m) => Ok(warp::reply::json(&m).into_response()),
        None => Ok(error_reply(
            StatusCode::NOT_FOUND,
            format!("member {} not found", id),
        )),
    }
}

async fn handle_rejection(err: Rejection) -> Result<warp::reply::Response, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "not found".to_owned())
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::PayloadTooLarge>() {
        (StatusCode::PAYLOAD_TOO_LARGE, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::LengthRequired>() {
        (StatusCode::LENGTH_REQUIRED, e.to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::UnsupportedMediaType>() {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string())
    } else if let Some(e) = err.find::<warp::reject::MethodNotAllowed>() {
        (StatusCode::METHOD_NOT_ALLOWED, e.to_string())
    } else if let Some(RepositoryFailure(e)) = err.find::<RepositoryFailure>() {
        error!(error = %e, "repository failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    } else {
        error!(rejection = ?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal server error".to_owned(),
        )
    };

    Ok(error_reply(code, message))
}
