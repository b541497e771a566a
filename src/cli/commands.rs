use std::collections::HashSet;

use serde::Serialize;

use crate::app::{AppContext, ClassifiedError, FolioError, Result};
use crate::domain::{Book, Category, DataState, ResultStream};
use crate::session::BrowseSession;
use crate::store::FavoritesStore;

#[derive(Serialize)]
struct BookRow<'a> {
    #[serde(flatten)]
    book: &'a Book,
    favorite: bool,
}

pub async fn trending(
    ctx: &AppContext,
    category: Option<Category>,
    pages: usize,
    json: bool,
) -> Result<()> {
    let category = category.unwrap_or(ctx.config.browse.default_category);
    let session = ctx.session();

    session.fetch_trending(category, true).await;

    // Page until the catalog runs dry or a page fails
    for _ in 1..pages {
        if !can_continue(&session.snapshot().trending) {
            break;
        }
        session.load_more_trending().await;
    }

    let state = session.snapshot();
    if !json {
        println!("Trending in {}:", category);
    }
    print_stream(ctx, &state.trending, json).await
}

pub async fn search(ctx: &AppContext, query: &str, pages: usize, json: bool) -> Result<()> {
    let session = ctx.session();

    session.update_query(query).await;
    if !session.snapshot().is_searching() {
        // Blank queries never reach the catalog
        println!("{}", blank_search_output(json));
        return Ok(());
    }

    // Page until the catalog runs dry or a page fails
    for _ in 1..pages {
        if !can_continue(&session.snapshot().search) {
            break;
        }
        session.load_more_search_results().await;
    }

    let state = session.snapshot();
    print_stream(ctx, &state.search, json).await
}

pub async fn show(ctx: &AppContext, id: &str, json: bool) -> Result<()> {
    let session = ctx.session();
    let book = resolve(&session, id).await?;

    // Resolving also refreshed the favorite status
    let favorite = session.snapshot().is_favorite(id);

    if json {
        let row = BookRow {
            book: &book,
            favorite,
        };
        println!("{}", serde_json::to_string_pretty(&row)?);
        return Ok(());
    }

    println!("{}{}", book.display_title(), if favorite { " ★" } else { "" });
    if let Some(subtitle) = &book.subtitle {
        println!("{}", subtitle);
    }
    println!("by {}", book.author_line());
    println!();
    print_field("ID", &book.id);
    print_field("Publisher", &book.publisher);
    print_field("Published", &book.published_date);
    print_field("ISBN", &book.isbn);
    print_field("Language", &book.language);
    if let Some(pages) = book.page_count {
        print_field("Pages", &pages.to_string());
    }
    if let Some(rating) = book.average_rating {
        print_field("Rating", &format!("{:.1} ({} ratings)", rating, book.ratings_count));
    }
    if !book.categories.is_empty() {
        print_field("Categories", &book.categories.join(", "));
    }
    if let Some(link) = book.best_link() {
        print_field("Link", link);
    }
    if !book.description.is_empty() {
        println!();
        println!("{}", book.description);
    }

    Ok(())
}

pub async fn toggle_favorite(ctx: &AppContext, id: &str) -> Result<()> {
    let session = ctx.session();

    // Favorites stay togglable even when the catalog no longer knows the id.
    let book = match ctx.store.all().await?.into_iter().find(|b| b.id == id) {
        Some(book) => book,
        None => resolve(&session, id).await?,
    };

    match session.toggle_favorite(&book).await {
        Some(true) => println!("Added to favorites: {}", book.display_title()),
        Some(false) => println!("Removed from favorites: {}", book.display_title()),
        None => return Err(session_error(&session)),
    }

    Ok(())
}

pub async fn list_favorites(ctx: &AppContext, json: bool) -> Result<()> {
    let books = ctx.store.all().await?;

    if json {
        let rows: Vec<_> = books
            .iter()
            .map(|book| BookRow {
                book,
                favorite: true,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if books.is_empty() {
        println!("No favorites yet. Add one with: folio favorite <id>");
        return Ok(());
    }

    for book in &books {
        print_row(book, true);
    }

    Ok(())
}

pub async fn open_book(ctx: &AppContext, id: &str) -> Result<()> {
    let session = ctx.session();
    let book = resolve(&session, id).await?;

    // Preview first, then the shop or reader link
    let link = book
        .best_link()
        .ok_or_else(|| FolioError::Other(format!("No link available for {}", id)))?;
    println!("Opening {}", link);
    open::that(link)?;

    Ok(())
}

pub fn list_categories(json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&Category::ALL)?);
        return Ok(());
    }

    for category in Category::ALL {
        println!("{:<14} {}", category.slug(), category.display_name());
    }

    Ok(())
}

fn blank_search_output(json: bool) -> &'static str {
    if json {
        "[]"
    } else {
        "Nothing to search for"
    }
}

fn can_continue(stream: &ResultStream<Book>) -> bool {
    stream.cursor.has_more && stream.last_error.is_none()
}

async fn resolve(session: &BrowseSession, id: &str) -> Result<Book> {
    match session.resolve_by_id(id).await {
        DataState::Success(book) => Ok(book),
        DataState::Error(error) => Err(FolioError::Other(error.to_string())),
        _ => Err(FolioError::BookNotFound(id.to_string())),
    }
}

fn session_error(session: &BrowseSession) -> FolioError {
    let error = session
        .snapshot()
        .error
        .clone()
        .unwrap_or_else(|| ClassifiedError::unclassified(""));
    FolioError::Other(error.to_string())
}

async fn print_stream(ctx: &AppContext, stream: &ResultStream<Book>, json: bool) -> Result<()> {
    if let Some(error) = stream.state().error() {
        return Err(FolioError::Other(error.to_string()));
    }

    // Mark favorites in the listing
    let favorites: HashSet<String> = ctx.store.all().await?.into_iter().map(|b| b.id).collect();

    if json {
        let rows: Vec<_> = stream
            .items
            .iter()
            .map(|book| BookRow {
                book,
                favorite: favorites.contains(&book.id),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if stream.items.is_empty() {
        println!("No books found");
        return Ok(());
    }

    for book in &stream.items {
        print_row(book, favorites.contains(&book.id));
    }

    if let Some(error) = &stream.last_error {
        eprintln!("Stopped early: {}", error);
    } else if stream.cursor.has_more {
        println!("\nMore results available (use --pages to load more)");
    }

    Ok(())
}

fn print_row(book: &Book, favorite: bool) {
    let marker = if favorite { "★" } else { " " };
    println!(
        "{} {:<14} {} ({})",
        marker,
        book.id,
        book.display_title(),
        book.author_line()
    );
}

fn print_field(label: &str, value: &str) {
    if !value.is_empty() {
        println!("{:<11} {}", format!("{}:", label), value);
    }
}
