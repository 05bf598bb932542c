use std::convert::Infallible;
use std::future::Future;
use std::net::{AddrParseError, SocketAddr};
use std::ops::Deref;
use std::str::{FromStr, Utf8Error};
use std::sync::Arc;

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use tracing::info;
use warp::{Filter, Reply};

use crate::api::{
    self,
    models::{DatasetRequest, JobRequest, NamespaceRequest, RunRequest, SourceRequest, TagRequest},
};
use crate::config::schema::HttpFrontend;
use crate::context::{CatalogContext, Paging};
use crate::data_types::RunState;

use super::http_utils::{into_response, ApiError};

/// A path segment with its percent-encoding removed, so that
/// `/datasets/room%20bookings` addresses the dataset `room bookings`.
struct Segment(String);

impl FromStr for Segment {
    type Err = Utf8Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(percent_decode_str(s).decode_utf8()?.into_owned()))
    }
}

impl Deref for Segment {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

fn with_context(
    context: Arc<CatalogContext>,
) -> impl Filter<Extract = (Arc<CatalogContext>,), Error = Infallible> + Clone {
    warp::any().map(move || context.clone())
}

fn paging() -> impl Filter<Extract = (Paging,), Error = warp::Rejection> + Clone {
    warp::query::<Paging>()
}

// Namespaces

// PUT /api/v1/namespaces/[namespace]
async fn put_namespace(
    context: Arc<CatalogContext>,
    name: Segment,
    body: Bytes,
) -> Result<impl Reply, ApiError> {
    let request: NamespaceRequest = api::decode(&body)?;
    let namespace = context.create_or_update_namespace(&name, &request).await?;
    Ok(warp::reply::json(&namespace))
}

// GET /api/v1/namespaces/[namespace]
async fn get_namespace(
    context: Arc<CatalogContext>,
    name: Segment,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(&context.get_namespace(&name).await?))
}

// GET /api/v1/namespaces
async fn list_namespaces(
    context: Arc<CatalogContext>,
    paging: Paging,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(&context.list_namespaces(paging).await?))
}

pub fn namespace_routes(
    context: Arc<CatalogContext>,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let put = warp::put()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment))
        .and(warp::body::bytes())
        .then(put_namespace)
        .map(into_response);

    let get = warp::get()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment))
        .then(get_namespace)
        .map(into_response);

    let list = warp::get()
        .and(with_context(context))
        .and(warp::path!("api" / "v1" / "namespaces"))
        .and(paging())
        .then(list_namespaces)
        .map(into_response);

    put.or(get).or(list)
}

// Sources

// PUT /api/v1/sources/[source]
async fn put_source(
    context: Arc<CatalogContext>,
    name: Segment,
    body: Bytes,
) -> Result<impl Reply, ApiError> {
    let request: SourceRequest = api::decode(&body)?;
    Ok(warp::reply::json(
        &context.create_or_update_source(&name, &request).await?,
    ))
}

// GET /api/v1/sources/[source]
async fn get_source(
    context: Arc<CatalogContext>,
    name: Segment,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(&context.get_source(&name).await?))
}

// GET /api/v1/sources
async fn list_sources(
    context: Arc<CatalogContext>,
    paging: Paging,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(&context.list_sources(paging).await?))
}

pub fn source_routes(
    context: Arc<CatalogContext>,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let put = warp::put()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "sources" / Segment))
        .and(warp::body::bytes())
        .then(put_source)
        .map(into_response);

    let get = warp::get()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "sources" / Segment))
        .then(get_source)
        .map(into_response);

    let list = warp::get()
        .and(with_context(context))
        .and(warp::path!("api" / "v1" / "sources"))
        .and(paging())
        .then(list_sources)
        .map(into_response);

    put.or(get).or(list)
}

// Datasets

// PUT /api/v1/namespaces/[namespace]/datasets/[dataset]
async fn put_dataset(
    context: Arc<CatalogContext>,
    namespace: Segment,
    name: Segment,
    body: Bytes,
) -> Result<impl Reply, ApiError> {
    let request: DatasetRequest = api::decode(&body)?;
    Ok(warp::reply::json(
        &context
            .create_or_update_dataset(&namespace, &name, &request)
            .await?,
    ))
}

// GET /api/v1/namespaces/[namespace]/datasets/[dataset]
async fn get_dataset(
    context: Arc<CatalogContext>,
    namespace: Segment,
    name: Segment,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(
        &context.get_dataset(&namespace, &name).await?,
    ))
}

// GET /api/v1/namespaces/[namespace]/datasets
async fn list_datasets(
    context: Arc<CatalogContext>,
    namespace: Segment,
    paging: Paging,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(
        &context.list_datasets(&namespace, paging).await?,
    ))
}

// POST /api/v1/namespaces/[namespace]/datasets/[dataset]/tags/[tag]
async fn tag_dataset(
    context: Arc<CatalogContext>,
    namespace: Segment,
    name: Segment,
    tag: Segment,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(
        &context.tag_dataset(&namespace, &name, &tag).await?,
    ))
}

// POST /api/v1/namespaces/[namespace]/datasets/[dataset]/fields/tags/[tag]
async fn tag_all_fields(
    context: Arc<CatalogContext>,
    namespace: Segment,
    name: Segment,
    tag: Segment,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(
        &context.tag_all_fields(&namespace, &name, &tag).await?,
    ))
}

// POST /api/v1/namespaces/[namespace]/datasets/[dataset]/fields/[field]/tags/[tag]
async fn tag_dataset_field(
    context: Arc<CatalogContext>,
    namespace: Segment,
    name: Segment,
    field: Segment,
    tag: Segment,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(
        &context
            .tag_dataset_field(&namespace, &name, &field, &tag)
            .await?,
    ))
}

pub fn dataset_routes(
    context: Arc<CatalogContext>,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let put = warp::put()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment / "datasets" / Segment))
        .and(warp::body::bytes())
        .then(put_dataset)
        .map(into_response);

    let get = warp::get()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment / "datasets" / Segment))
        .then(get_dataset)
        .map(into_response);

    let list = warp::get()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment / "datasets"))
        .and(paging())
        .then(list_datasets)
        .map(into_response);

    let tag = warp::post()
        .and(with_context(context.clone()))
        .and(warp::path!(
            "api" / "v1" / "namespaces" / Segment / "datasets" / Segment / "tags" / Segment
        ))
        .then(tag_dataset)
        .map(into_response);

    let tag_fields = warp::post()
        .and(with_context(context.clone()))
        .and(warp::path!(
            "api" / "v1" / "namespaces" / Segment / "datasets" / Segment / "fields" / "tags"
                / Segment
        ))
        .then(tag_all_fields)
        .map(into_response);

    let tag_field = warp::post()
        .and(with_context(context))
        .and(warp::path!(
            "api" / "v1" / "namespaces" / Segment / "datasets" / Segment / "fields" / Segment
                / "tags"
                / Segment
        ))
        .then(tag_dataset_field)
        .map(into_response);

    put.or(get)
        .or(list)
        .or(tag)
        .or(tag_fields)
        .or(tag_field)
}

// Jobs and runs

// PUT /api/v1/namespaces/[namespace]/jobs/[job]
async fn put_job(
    context: Arc<CatalogContext>,
    namespace: Segment,
    name: Segment,
    body: Bytes,
) -> Result<impl Reply, ApiError> {
    let request: JobRequest = api::decode(&body)?;
    Ok(warp::reply::json(
        &context
            .create_or_update_job(&namespace, &name, &request)
            .await?,
    ))
}

// GET /api/v1/namespaces/[namespace]/jobs/[job]
async fn get_job(
    context: Arc<CatalogContext>,
    namespace: Segment,
    name: Segment,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(&context.get_job(&namespace, &name).await?))
}

// GET /api/v1/namespaces/[namespace]/jobs
async fn list_jobs(
    context: Arc<CatalogContext>,
    namespace: Segment,
    paging: Paging,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(
        &context.list_jobs(&namespace, paging).await?,
    ))
}

// POST /api/v1/namespaces/[namespace]/jobs/[job]/runs
async fn create_run(
    context: Arc<CatalogContext>,
    namespace: Segment,
    job: Segment,
    body: Bytes,
) -> Result<impl Reply, ApiError> {
    // An empty body is a run without nominal times or args
    let request: RunRequest = if body.is_empty() {
        RunRequest::default()
    } else {
        api::decode(&body)?
    };
    let run = context.create_run(&namespace, &job, &request).await?;
    Ok(warp::reply::with_status(
        warp::reply::json(&run),
        warp::http::StatusCode::CREATED,
    ))
}

// GET /api/v1/namespaces/[namespace]/jobs/[job]/runs
async fn list_runs(
    context: Arc<CatalogContext>,
    namespace: Segment,
    job: Segment,
    paging: Paging,
) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(
        &context.list_runs(&namespace, &job, paging).await?,
    ))
}

// GET /api/v1/jobs/runs/[run id]
async fn get_run(context: Arc<CatalogContext>, id: Segment) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(&context.get_run(&id).await?))
}

// POST /api/v1/jobs/runs/[run id]/[start|complete|fail|abort]
fn mark_run(
    context: Arc<CatalogContext>,
    action: &'static str,
    state: RunState,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    warp::post()
        .and(with_context(context))
        .and(warp::path!("api" / "v1" / "jobs" / "runs" / Segment / ..))
        .and(warp::path(action))
        .and(warp::path::end())
        .then(move |context: Arc<CatalogContext>, id: Segment| async move {
            Ok::<_, ApiError>(warp::reply::json(&context.mark_run_as(&id, state).await?))
        })
        .map(into_response)
}

pub fn job_routes(
    context: Arc<CatalogContext>,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let put = warp::put()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment / "jobs" / Segment))
        .and(warp::body::bytes())
        .then(put_job)
        .map(into_response);

    let get = warp::get()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment / "jobs" / Segment))
        .then(get_job)
        .map(into_response);

    let list = warp::get()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment / "jobs"))
        .and(paging())
        .then(list_jobs)
        .map(into_response);

    let new_run = warp::post()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment / "jobs" / Segment / "runs"))
        .and(warp::body::bytes())
        .then(create_run)
        .map(into_response);

    let runs = warp::get()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "namespaces" / Segment / "jobs" / Segment / "runs"))
        .and(paging())
        .then(list_runs)
        .map(into_response);

    let run = warp::get()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "jobs" / "runs" / Segment))
        .then(get_run)
        .map(into_response);

    put.or(get)
        .or(list)
        .or(new_run)
        .or(runs)
        .or(run)
        .or(mark_run(context.clone(), "start", RunState::Running))
        .or(mark_run(context.clone(), "complete", RunState::Completed))
        .or(mark_run(context.clone(), "fail", RunState::Failed))
        .or(mark_run(context, "abort", RunState::Aborted))
}

// Tags

// GET /api/v1/tags
async fn list_tags(context: Arc<CatalogContext>, paging: Paging) -> Result<impl Reply, ApiError> {
    Ok(warp::reply::json(&context.list_tags(paging).await?))
}

// PUT /api/v1/tags/[tag]
async fn put_tag(
    context: Arc<CatalogContext>,
    name: Segment,
    body: Bytes,
) -> Result<impl Reply, ApiError> {
    let request: TagRequest = if body.is_empty() {
        TagRequest::default()
    } else {
        api::decode(&body)?
    };
    Ok(warp::reply::json(
        &context.create_or_update_tag(&name, &request).await?,
    ))
}

pub fn tag_routes(
    context: Arc<CatalogContext>,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let list = warp::get()
        .and(with_context(context.clone()))
        .and(warp::path!("api" / "v1" / "tags"))
        .and(paging())
        .then(list_tags)
        .map(into_response);

    let put = warp::put()
        .and(with_context(context))
        .and(warp::path!("api" / "v1" / "tags" / Segment))
        .and(warp::body::bytes())
        .then(put_tag)
        .map(into_response);

    list.or(put)
}

pub fn filters(
    context: Arc<CatalogContext>,
) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["Content-Type"])
        .allow_methods(vec!["GET", "POST", "PUT"]);

    namespace_routes(context.clone())
        .or(source_routes(context.clone()))
        .or(dataset_routes(context.clone()))
        .or(job_routes(context.clone()))
        .or(tag_routes(context))
        .with(cors)
        .with(warp::trace::request())
}

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Error parsing the listen address {0:?}: {1}")]
    Address(String, AddrParseError),

    #[error("Error binding the HTTP frontend: {0}")]
    Bind(#[from] warp::Error),
}

/// Serve the API until `shutdown` resolves.
pub async fn run_server(
    context: Arc<CatalogContext>,
    config: HttpFrontend,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), ServerError> {
    let filters = filters(context);

    let address = format!("{}:{}", config.bind_host, config.bind_port);
    let socket_addr: SocketAddr = address
        .parse()
        .map_err(|e| ServerError::Address(address.clone(), e))?;

    let (addr, server) =
        warp::serve(filters).try_bind_with_graceful_shutdown(socket_addr, shutdown)?;
    info!("Starting the HTTP frontend on {addr}");
    server.await;
    Ok(())
}
