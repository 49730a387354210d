//! Admin registrations for the movie catalog.
//!
//! One function per model builds its [`ModelAdmin`]; [`register`] installs
//! all of them, together with the publish/unpublish actions, on a site.

use crate::actions::SetDraftAction;
use crate::model_admin::{FieldSchema, Fieldset, InlineAdmin, ModelAdmin, ModelRegistry};
use crate::photo::PhotoPreview;
use crate::site::AdminSite;

/// The application label of every catalog model.
pub const APP_LABEL: &str = "movies";

pub fn category_admin() -> ModelAdmin {
    ModelAdmin::new(APP_LABEL, "category", "movies_category")
        .verbose_name_plural("categories")
        .fields(vec![
            FieldSchema::auto_id(),
            FieldSchema::char("name", 150).label("Category"),
            FieldSchema::text("description").with_default().label("Description"),
            FieldSchema::slug("url", 160).label("Url"),
        ])
        .list_display(vec!["id", "name", "url"])
        .list_display_links(vec!["name"])
        .prepopulate("url", vec!["name"])
        .str_sql("name")
}

pub fn actor_admin() -> ModelAdmin {
    ModelAdmin::new(APP_LABEL, "actor", "movies_actor")
        .verbose_name("actors and directors")
        .verbose_name_plural("actors and directors")
        .fields(vec![
            FieldSchema::auto_id(),
            FieldSchema::char("name", 100).label("Name"),
            FieldSchema::positive_integer("age").with_default().label("Age"),
            FieldSchema::text("description").label("Description"),
            FieldSchema::image("image", "actors/").label("Image"),
        ])
        .list_display(vec!["name", "age", "image_preview"])
        .preview(PhotoPreview::new("image_preview", "image", 50, 50))
        .str_sql("name")
}

pub fn genre_admin() -> ModelAdmin {
    ModelAdmin::new(APP_LABEL, "genre", "movies_genre")
        .fields(vec![
            FieldSchema::auto_id(),
            FieldSchema::char("name", 100).label("Name"),
            FieldSchema::text("description").label("Description"),
            FieldSchema::slug("url", 160).label("Url"),
        ])
        .list_display(vec!["name", "url"])
        .prepopulate("url", vec!["name"])
        .str_sql("name")
}

fn movie_fieldsets() -> Vec<Fieldset> {
    vec![
        Fieldset::new().line(&["title", "tagline"]),
        Fieldset::new()
            .line(&["description"])
            .line(&["poster", "poster_preview"]),
        Fieldset::new().line(&["year", "world_premiere", "country"]),
        Fieldset::named("Actors")
            .classes(vec!["collapse"])
            .line(&["actors", "directors", "genres", "category"]),
        Fieldset::new().line(&["budget", "fees_in_usa", "fees_in_world"]),
        Fieldset::named("Options").line(&["url", "draft"]),
    ]
}

pub fn movie_admin() -> ModelAdmin {
    ModelAdmin::new(APP_LABEL, "movie", "movies_movie")
        .fields(vec![
            FieldSchema::auto_id(),
            FieldSchema::char("title", 100).label("Title"),
            FieldSchema::char("tagline", 100).with_default().label("Tagline"),
            FieldSchema::text("description").label("Description"),
            FieldSchema::image("poster", "movies/").label("Poster"),
            FieldSchema::positive_integer("year").with_default().label("Release date"),
            FieldSchema::char("country", 30).label("Country"),
            FieldSchema::many_to_many(
                "directors",
                "movies.actor",
                "movies_movie_directors",
                "movie_id",
                "actor_id",
            )
            .label("director"),
            FieldSchema::many_to_many(
                "actors",
                "movies.actor",
                "movies_movie_actors",
                "movie_id",
                "actor_id",
            )
            .label("actors"),
            FieldSchema::many_to_many(
                "genres",
                "movies.genre",
                "movies_movie_genres",
                "movie_id",
                "genre_id",
            )
            .label("genres"),
            FieldSchema::date("world_premiere").with_default().label("World premiere"),
            FieldSchema::positive_integer("budget")
                .with_default()
                .label("Budget"),
            FieldSchema::positive_integer("fees_in_usa")
                .with_default()
                .label("Fees in USA"),
            FieldSchema::positive_integer("fees_in_world")
                .with_default()
                .label("Fees in world"),
            FieldSchema::foreign_key("category", "movies.category")
                .optional()
                .label("Category"),
            FieldSchema::slug("url", 130),
            FieldSchema::boolean("draft").with_default().label("Draft"),
        ])
        .list_display(vec!["title", "category", "url", "draft"])
        .list_display_links(vec!["title"])
        .list_filter(vec!["category", "year"])
        .search_fields(vec!["title", "category__name"])
        .list_editable(vec!["draft"])
        .preview(PhotoPreview::new("poster_preview", "poster", 110, 110).label("Poster"))
        .inlines(vec![
            InlineAdmin::tabular("movies.movieshot", "movie")
                .extra(1)
                .preview(PhotoPreview::new("image_preview", "image", 50, 50)),
            InlineAdmin::tabular("movies.review", "movie")
                .extra(1)
                .readonly_fields(vec!["name", "email"]),
        ])
        .actions(vec!["publish", "unpublish"])
        .prepopulate("url", vec!["title"])
        .save_on_top(true)
        .save_as(true)
        .fieldsets(movie_fieldsets())
        .str_sql("title")
}

pub fn movieshot_admin() -> ModelAdmin {
    ModelAdmin::new(APP_LABEL, "movieshot", "movies_movieshot")
        .verbose_name("movie shot")
        .verbose_name_plural("movie shots")
        .fields(vec![
            FieldSchema::auto_id(),
            FieldSchema::char("title", 100).label("Title"),
            FieldSchema::text("description").label("Description"),
            FieldSchema::image("image", "movie_shots/").label("Image"),
            FieldSchema::foreign_key("movie", "movies.movie").label("Movie"),
        ])
        .list_display(vec!["title", "movie", "image_preview"])
        .preview(PhotoPreview::new("image_preview", "image", 50, 50))
        .str_sql("title")
}

pub fn ratingstar_admin() -> ModelAdmin {
    ModelAdmin::new(APP_LABEL, "ratingstar", "movies_ratingstar")
        .verbose_name("rating star")
        .verbose_name_plural("rating stars")
        .fields(vec![
            FieldSchema::auto_id(),
            FieldSchema::small_integer("value").with_default().label("Value"),
        ])
        .ordering(vec!["-value"])
        .str_sql("CAST(value AS TEXT)")
}

pub fn rating_admin() -> ModelAdmin {
    ModelAdmin::new(APP_LABEL, "rating", "movies_rating")
        .fields(vec![
            FieldSchema::auto_id(),
            FieldSchema::char("ip", 45).label("IP address"),
            FieldSchema::foreign_key("star", "movies.ratingstar").label("star"),
            FieldSchema::foreign_key("movie", "movies.movie").label("movie"),
        ])
        .list_display(vec!["star", "movie", "ip"])
        .str_sql(
            "(SELECT value FROM movies_ratingstar WHERE id = star_id) || ' - ' || \
             (SELECT title FROM movies_movie WHERE id = movie_id)",
        )
}

pub fn review_admin() -> ModelAdmin {
    ModelAdmin::new(APP_LABEL, "review", "movies_review")
        .fields(vec![
            FieldSchema::auto_id(),
            FieldSchema::email("email", 254),
            FieldSchema::char("name", 100).label("Name"),
            FieldSchema::text_max("text", 5000).label("Message"),
            FieldSchema::foreign_key("parent", "movies.review")
                .optional()
                .label("Parent"),
            FieldSchema::foreign_key("movie", "movies.movie").label("movie"),
        ])
        .list_display(vec!["name", "email", "parent", "movie"])
        .list_display_links(vec!["name"])
        .readonly_fields(vec!["name", "email"])
        .str_sql("name || ' - ' || (SELECT title FROM movies_movie WHERE id = movie_id)")
}

/// Every catalog registration.
pub fn admins() -> Vec<ModelAdmin> {
    vec![
        category_admin(),
        actor_admin(),
        genre_admin(),
        movie_admin(),
        movieshot_admin(),
        ratingstar_admin(),
        rating_admin(),
        review_admin(),
    ]
}

/// A registry holding every catalog model.
pub fn registry() -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    for admin in admins() {
        registry.register(admin);
    }
    registry
}

/// Registers the catalog models and the publish/unpublish actions.
pub fn register(site: &mut AdminSite) {
    for admin in admins() {
        site.register(admin);
    }
    site.register_action(Box::new(SetDraftAction::publish()));
    site.register_action(Box::new(SetDraftAction::unpublish()));
}
