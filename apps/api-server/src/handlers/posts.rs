//! Post handlers: creation, viewing, listing, update, and soft delete.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use quill_core::domain::{NewPost, Post, PostPatch, PostState};
use quill_core::query::{ListQuery, Page, PostScope};
use quill_shared::ApiResponse;
use quill_shared::dto::{
    CreatePostRequest, ListPostsQuery, OwnerPostsQuery, PageResponse, PostResponse,
    UpdatePostRequest,
};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

fn to_response(post: Post) -> PostResponse {
    PostResponse {
        id: post.id.to_string(),
        author_id: post.author_id.to_string(),
        author: post.author_name,
        title: post.title,
        description: post.description,
        body: post.body,
        tags: post.tags,
        state: post.state.as_str().to_string(),
        read_count: post.read_count,
        reading_time: post.reading_time,
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

fn to_page_response(page: Page<Post>) -> PageResponse<PostResponse> {
    PageResponse {
        total: page.total,
        total_pages: page.total_pages,
        current_page: page.current_page,
        items: page.items.into_iter().map(to_response).collect(),
    }
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let fields = NewPost {
        title: req.title,
        description: req.description,
        body: req.body,
        tags: req.tags,
    };

    let post = state.blog.create(&identity.caller(), fields).await?;
    Ok(HttpResponse::Created().json(ApiResponse::ok(to_response(post))))
}

/// GET /api/posts - public listing with pagination, search, and sorting.
pub async fn list(
    state: web::Data<AppState>,
    params: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();
    let query = ListQuery::new(
        PostScope::Public {
            search: params.search,
        },
        params.page,
        params.limit,
        params.order_by.as_deref(),
        params.order.as_deref(),
    );

    let page = state.blog.list(&query).await?;
    let response = to_page_response(page);
    if response.items.is_empty() {
        return Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(response, "No content")));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::ok(response)))
}

/// GET /api/me/posts - owner listing, drafts included.
pub async fn my_posts(
    state: web::Data<AppState>,
    identity: Identity,
    params: web::Query<OwnerPostsQuery>,
) -> AppResult<HttpResponse> {
    let params = params.into_inner();
    let query = ListQuery::new(
        PostScope::Owner {
            author_id: identity.user_id,
            // Unknown state values are ignored, not rejected.
            state: params.state.as_deref().and_then(PostState::parse),
        },
        params.page,
        params.limit,
        params.order_by.as_deref(),
        params.order.as_deref(),
    );

    let page = state.blog.list(&query).await?;
    let response = to_page_response(page);
    if response.items.is_empty() {
        return Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(response, "No content")));
    }
    Ok(HttpResponse::Ok().json(ApiResponse::ok(response)))
}

/// GET /api/posts/{id}
///
/// Anonymous callers read through the public path; the author reads their own
/// posts, drafts included. Every successful view counts a read.
pub async fn view(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let caller = identity.caller();

    let post = state.blog.view(caller.as_ref(), post_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}

/// PATCH /api/posts/{id} - partial update; absent fields are left untouched.
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let req = body.into_inner();

    let patch = PostPatch {
        title: req.title,
        description: req.description,
        body: req.body,
        tags: req.tags,
        state: req.state.as_deref().and_then(PostState::parse),
    };

    let post = state.blog.update(&identity.caller(), post_id, patch).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(to_response(post))))
}

/// DELETE /api/posts/{id} - soft delete; the record stays in the store.
pub async fn delete(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();

    state.blog.soft_delete(&identity.caller(), post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}
