//! Server-rendered pages.
//!
//! Every page is a form or a short listing. User-supplied text goes through
//! `escape`.

use axum::response::Html;

use crate::auth::CurrentAccount;
use crate::forms::{AddBookForm, LoginForm, ProfileForm, RegisterForm, ReviewForm, ShelfForm};
use crate::models::{Account, Book};
use crate::services::Shelf;
use crate::services::shelf_service::ShelfItem;

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn profile_path(username: &str) -> String {
    format!("/{}-profile", urlencoding::encode(username))
}

fn layout(title: &str, account: Option<&Account>, body: &str) -> Html<String> {
    let nav = match account {
        Some(account) => format!(
            r#"<a href="{}">{}</a> | <a href="/to_read">To read</a> | <a href="/wishlist">Wishlist</a> | <a href="/add">Read</a> | <a href="/logout">Log out</a>"#,
            profile_path(&account.username),
            escape(&account.username)
        ),
        None => r#"<a href="/login">Log in</a> | <a href="/register">Register</a>"#.to_string(),
    };

    Html(format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{title} - Virtual Bookshelf</title></head>\
         <body><nav><a href=\"/\">Virtual Bookshelf</a> | {nav}</nav><main><h1>{title}</h1>{body}</main></body></html>",
        title = escape(title),
    ))
}

fn error_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", escape(e)))
        .collect();
    format!(r#"<ul class="errors">{}</ul>"#, items)
}

fn input(kind: &str, name: &str, label: &str, value: &str) -> String {
    format!(
        r#"<p><label>{label} <input type="{kind}" name="{name}" value="{value}"></label></p>"#,
        label = escape(label),
        value = escape(value),
    )
}

fn csrf_input(token: &str) -> String {
    format!(
        r#"<input type="hidden" name="csrf_token" value="{}">"#,
        escape(token)
    )
}

/// Forms posted by a signed-in account carry the session's CSRF token.
fn form(action: &str, csrf: Option<&str>, fields: &[String], submit: &str) -> String {
    format!(
        r#"<form method="post" action="{}">{}{}<button type="submit">{}</button></form>"#,
        escape(action),
        csrf.map(csrf_input).unwrap_or_default(),
        fields.concat(),
        escape(submit)
    )
}

fn book_label(item: &ShelfItem) -> String {
    match &item.book {
        Some(book) => format!("{} by {}", escape(&book.title), escape(&book.author)),
        None => format!("ISBN {}", escape(&item.isbn)),
    }
}

pub fn home(account: Option<&Account>) -> Html<String> {
    let body = match account {
        Some(account) => format!(
            r#"<p>Welcome back, {}. Your shelves are on <a href="{}">your profile</a>.</p>"#,
            escape(&account.username),
            profile_path(&account.username)
        ),
        None => "<p>Keep track of the books you want to read, wish for and have read.</p>"
            .to_string(),
    };
    layout("Home", account, &body)
}

pub fn login(form_data: &LoginForm, errors: &[String]) -> Html<String> {
    let body = format!(
        "{}{}",
        error_list(errors),
        form(
            "/login",
            None,
            &[
                input("text", "username", "Username", &form_data.username),
                input("password", "password", "Password", ""),
            ],
            "Log in",
        )
    );
    layout("Log in", None, &body)
}

pub fn register(form_data: &RegisterForm, errors: &[String]) -> Html<String> {
    let body = format!(
        "{}{}",
        error_list(errors),
        form(
            "/register",
            None,
            &[
                input("text", "username", "Username", &form_data.username),
                input("email", "email", "Email Address", &form_data.email),
                input("password", "password", "New Password", ""),
                input("password", "confirm", "Repeat Password", ""),
            ],
            "Register",
        )
    );
    layout("Register", None, &body)
}

pub fn shelf_add(
    current: &CurrentAccount,
    shelf: Shelf,
    form_data: &ShelfForm,
    errors: &[String],
) -> Html<String> {
    let title = match shelf {
        Shelf::ToRead => "Add to your to-read list",
        Shelf::Wishlist => "Add to your wishlist",
        Shelf::Read => "Add a book you have read",
    };
    let body = format!(
        "{}{}",
        error_list(errors),
        form(
            shelf.route(),
            Some(&current.csrf_token),
            &[
                input("text", "ISBN", "ISBN", &form_data.isbn),
                input("text", "title", "Title", &form_data.title),
            ],
            "Add",
        )
    );
    layout(title, Some(&current.account), &body)
}

pub fn new_book(
    current: &CurrentAccount,
    action: &str,
    form_data: &AddBookForm,
    errors: &[String],
) -> Html<String> {
    let body = format!(
        "{}{}",
        error_list(errors),
        form(
            action,
            Some(&current.csrf_token),
            &[
                input("text", "ISBN", "ISBN", &form_data.isbn),
                input("text", "title", "Book title", &form_data.title),
                input("text", "author", "Book author", &form_data.author),
                input("text", "date", "Year of publication", &form_data.date),
                input("text", "publisher", "Publisher", &form_data.publisher),
                input("text", "Image_URL", "Image URL", &form_data.image_url),
            ],
            "Save book",
        )
    );
    layout("New book", Some(&current.account), &body)
}

pub fn review(
    current: &CurrentAccount,
    entry_id: i32,
    form_data: &ReviewForm,
    errors: &[String],
) -> Html<String> {
    let body = format!(
        r#"{}<form method="post" action="/bookreview/{}">{}{}<p><label>Review <textarea name="review">{}</textarea></label></p>{}<button type="submit">Save review</button></form>"#,
        error_list(errors),
        entry_id,
        csrf_input(&current.csrf_token),
        input("number", "rating", "Rating (0-10)", &form_data.rating),
        escape(&form_data.review),
        input("text", "update_image", "Update book display", &form_data.update_image),
    );
    layout("Review", Some(&current.account), &body)
}

pub fn profile_edit(current: &CurrentAccount, form_data: &ProfileForm) -> Html<String> {
    let body = form(
        &format!("/edit/{}", current.id()),
        Some(&current.csrf_token),
        &[
            input("email", "email", "Email", &form_data.email),
            input("text", "hobbies", "Hobbies", &form_data.hobbies),
            input("text", "country", "Country", &form_data.country),
            input("text", "about", "About", &form_data.about),
        ],
        "Update profile",
    );
    layout("Edit profile", Some(&current.account), &body)
}

pub struct ProfilePage<'a> {
    pub current: &'a CurrentAccount,
    pub favourite: Option<ShelfItem>,
    pub wish: Option<Book>,
    pub to_read: Vec<ShelfItem>,
    pub wishlist: Vec<ShelfItem>,
    pub read: Vec<ShelfItem>,
}

fn simple_list(items: &[ShelfItem]) -> String {
    if items.is_empty() {
        return "<p>Nothing here yet.</p>".to_string();
    }
    let rows: String = items
        .iter()
        .map(|item| format!("<li>{}</li>", book_label(item)))
        .collect();
    format!("<ul>{}</ul>", rows)
}

fn read_list(items: &[ShelfItem], csrf: &str) -> String {
    if items.is_empty() {
        return "<p>Nothing here yet.</p>".to_string();
    }
    let rows: String = items
        .iter()
        .map(|item| {
            let rating = item
                .rating
                .map(|r| format!(" ({}/10)", r))
                .unwrap_or_default();
            format!(
                r#"<li>{}{} <a href="/bookreview/{id}">review</a> <a href="/delete/{id}?csrf={csrf}">delete</a></li>"#,
                book_label(item),
                rating,
                id = item.entry_id,
                csrf = urlencoding::encode(csrf)
            )
        })
        .collect();
    format!("<ul>{}</ul>", rows)
}

pub fn profile(page: ProfilePage<'_>) -> Html<String> {
    let account = &page.current.account;
    let mut body = String::new();

    let details = [
        ("Email", &account.email),
        ("Hobbies", &account.hobbies),
        ("Country", &account.country),
        ("About", &account.about),
    ];
    body.push_str("<dl>");
    for (label, value) in details {
        if let Some(value) = value {
            body.push_str(&format!("<dt>{}</dt><dd>{}</dd>", label, escape(value)));
        }
    }
    body.push_str(&format!(
        r#"</dl><p><a href="/edit/{}">Edit profile</a></p>"#,
        account.id
    ));

    if let Some(item) = &page.favourite {
        body.push_str(&format!(
            "<section><h2>A favourite</h2><p>{} - {}/10</p><blockquote>{}</blockquote></section>",
            book_label(item),
            item.rating.unwrap_or_default(),
            escape(item.review.as_deref().unwrap_or(""))
        ));
    }

    if let Some(book) = &page.wish {
        let image = book
            .image_url
            .as_deref()
            .map(|url| format!(r#"<img src="{}" alt="">"#, escape(url)))
            .unwrap_or_default();
        body.push_str(&format!(
            "<section><h2>On your wishlist</h2><p>{}{} by {}</p></section>",
            image,
            escape(&book.title),
            escape(&book.author)
        ));
    }

    body.push_str(&format!(
        "<h2>To read</h2>{}<h2>Wishlist</h2>{}<h2>Read</h2>{}",
        simple_list(&page.to_read),
        simple_list(&page.wishlist),
        read_list(&page.read, &page.current.csrf_token)
    ));

    layout(&account.username, Some(account), &body)
}
