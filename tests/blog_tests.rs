
use partners_points_backend::{
    entities::{
        blog_post::{BlogListQuery, NewBlogPostRequest, PostStatus, UpdateBlogPostRequest},
        option_fields::OptionField,
    },
    errors::AppError,
    use_cases::blog::BlogPostHandler,
};
use chrono::{Duration, Utc};
use serde_json::json;
use test_utils::*;

fn handler() -> BlogPostHandler<InMemoryBlogPostRepo> {
    BlogPostHandler::new(InMemoryBlogPostRepo::new())
}

fn request(title: &str, status: &str) -> NewBlogPostRequest {
    serde_json::from_value(json!({
        "title": title,
        "content": format!("<p>{} for local businesses.</p>", title),
        "category": "Guides",
        "tags": ["Loyalty", "retail"],
        "status": status,
    }))
    .expect("valid blog post request")
}

fn status_update(status: PostStatus) -> UpdateBlogPostRequest {
    UpdateBlogPostRequest {
        status: OptionField::SetToValue(status),
        ..Default::default()
    }
}

#[actix_rt::test]
async fn colliding_titles_get_numbered_slugs() {
    let blog = handler();

    let first = blog.create_blog_post(request("Café Rewards 101", "draft")).await.unwrap();
    let second = blog.create_blog_post(request("Cafe rewards 101!", "draft")).await.unwrap();
    let third = blog.create_blog_post(request("Café Rewards 101", "draft")).await.unwrap();

    assert_eq!(first.slug, "cafe-rewards-101");
    assert_eq!(second.slug, "cafe-rewards-101-1");
    assert_eq!(third.slug, "cafe-rewards-101-2");
}

#[actix_rt::test]
async fn losing_an_insert_race_retries_with_a_fresh_slug() {
    let blog = handler();
    blog.create_blog_post(request("Referral programs", "draft")).await.unwrap();

    blog.blog_post_repo.hidden_slugs.lock().push("referral-programs".into());
    let post = blog.create_blog_post(request("Referral programs", "draft")).await.unwrap();

    assert_eq!(post.slug, "referral-programs-1");
}

#[actix_rt::test]
async fn invalid_post_is_rejected_before_storage() {
    let blog = handler();
    let bad: NewBlogPostRequest = serde_json::from_value(json!({
        "title": "  padded title  ",
        "content": "   ",
    }))
    .unwrap();

    let err = blog.create_blog_post(bad).await.unwrap_err();

    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(blog.stats().await.unwrap().total, 0);
}

#[actix_rt::test]
async fn publishing_stamps_once_and_republishing_restamps() {
    let blog = handler();
    let draft = blog.create_blog_post(request("Seasonal promotions", "draft")).await.unwrap();
    assert!(draft.published_at.is_none());

    let published = blog
        .update_blog_post(&draft.slug, status_update(PostStatus::Published))
        .await
        .unwrap();
    let first_stamp = published.published_at.expect("stamped on publish");

    let edited = blog
        .update_blog_post(&draft.slug, UpdateBlogPostRequest {
            title: OptionField::SetToValue("Seasonal promotions that work".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(edited.published_at, Some(first_stamp));
    assert_eq!(edited.slug, draft.slug, "slug never changes on update");

    let archived = blog
        .update_blog_post(&draft.slug, status_update(PostStatus::Archived))
        .await
        .unwrap();
    assert_eq!(archived.published_at, Some(first_stamp));

    let republished = blog
        .update_blog_post(&draft.slug, status_update(PostStatus::Published))
        .await
        .unwrap();
    assert!(republished.published_at.unwrap() >= first_stamp);
}

#[actix_rt::test]
async fn public_reads_count_views_and_hide_drafts() {
    let blog = handler();
    let live = blog.create_blog_post(request("Points that convert", "published")).await.unwrap();
    let draft = blog.create_blog_post(request("Unfinished thoughts", "draft")).await.unwrap();

    blog.get_published_post(&live.slug).await.unwrap();
    let seen = blog.get_published_post(&live.slug).await.unwrap();
    assert_eq!(seen.view_count, 2);

    let err = blog.get_published_post(&draft.slug).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let admin_view = blog.get_post(&draft.slug).await.unwrap();
    assert_eq!(admin_view.status, PostStatus::Draft);
}

#[actix_rt::test]
async fn patch_clears_nullable_fields_and_keeps_absent_ones() {
    let blog = handler();
    let post = blog.create_blog_post(request("Stamp cards are dead", "draft")).await.unwrap();
    assert_eq!(post.category.as_deref(), Some("Guides"));

    let update: UpdateBlogPostRequest = serde_json::from_value(json!({ "category": null })).unwrap();
    let updated = blog.update_blog_post(&post.slug, update).await.unwrap();

    assert_eq!(updated.category, None);
    assert_eq!(updated.tags, vec!["loyalty", "retail"]);
    assert_eq!(updated.title, post.title);
}

#[actix_rt::test]
async fn public_listing_only_shows_published_posts() {
    let blog = handler();
    blog.create_blog_post(request("Loyalty for bakeries", "published")).await.unwrap();
    blog.create_blog_post(request("Loyalty for gyms", "published")).await.unwrap();
    blog.create_blog_post(request("Loyalty for salons", "draft")).await.unwrap();

    let query = BlogListQuery {
        status: Some("draft".into()),
        ..Default::default()
    };
    let listing = blog.list_blog_posts(&query.into_public_filter()).await.unwrap();

    assert_eq!(listing.pagination.total, 2);
    assert!(listing.posts.iter().all(|p| p.status == PostStatus::Published));

    let admin = BlogListQuery::default().into_admin_filter().unwrap();
    assert_eq!(blog.list_blog_posts(&admin).await.unwrap().pagination.total, 3);
}

#[actix_rt::test]
async fn search_is_case_insensitive_and_paginates() {
    let blog = handler();
    for title in ["Bakery rewards", "Coffee rewards", "Gym memberships"] {
        blog.create_blog_post(request(title, "published")).await.unwrap();
    }

    let query = BlogListQuery {
        search: Some("REWARDS".into()),
        limit: Some(1),
        ..Default::default()
    };
    let listing = blog.list_blog_posts(&query.into_public_filter()).await.unwrap();

    assert_eq!(listing.pagination.total, 2);
    assert_eq!(listing.posts.len(), 1);
    assert!(listing.pagination.has_more);
}

#[actix_rt::test]
async fn search_matches_title_or_body_newest_publication_first() {
    let blog = handler();
    let now = Utc::now();

    let basics = blog.create_blog_post(request("Loyalty basics", "published")).await.unwrap();
    let promo = blog
        .create_blog_post(
            serde_json::from_value(json!({
                "title": "Spring promotion ideas",
                "content": "<p>Pair seasonal offers with a LOYALTY stamp card.</p>",
                "status": "published",
            }))
            .unwrap(),
        )
        .await
        .unwrap();
    let gyms = blog.create_blog_post(request("Loyalty for gyms", "draft")).await.unwrap();
    let points = blog.create_blog_post(request("Loyalty points explained", "draft")).await.unwrap();
    blog.create_blog_post(request("Gym memberships", "published")).await.unwrap();

    let repo = &blog.blog_post_repo;
    repo.set_timestamps(&basics.slug, Some(now - Duration::days(3)), now - Duration::days(10));
    repo.set_timestamps(&promo.slug, Some(now - Duration::days(1)), now - Duration::days(9));
    repo.set_timestamps(&gyms.slug, None, now - Duration::days(2));
    repo.set_timestamps(&points.slug, None, now - Duration::days(5));

    let query = BlogListQuery {
        search: Some("loyalty".into()),
        ..Default::default()
    };
    let listing = blog.list_blog_posts(&query.into_admin_filter().unwrap()).await.unwrap();

    let slugs: Vec<&str> = listing.posts.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, [promo.slug.as_str(), basics.slug.as_str(), gyms.slug.as_str(), points.slug.as_str()]);
    assert_eq!(listing.pagination.total, 4);
}

#[actix_rt::test]
async fn delete_is_permanent() {
    let blog = handler();
    let post = blog.create_blog_post(request("Short lived", "published")).await.unwrap();

    blog.delete_blog_post(&post.slug).await.unwrap();

    assert!(matches!(blog.get_post(&post.slug).await, Err(AppError::NotFound(_))));
    assert!(matches!(blog.delete_blog_post(&post.slug).await, Err(AppError::NotFound(_))));
}
