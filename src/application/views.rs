//! HTML pages served by the greeting routes.

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE HTML>\n\
         <html>\n\
         <head>\n\
         <title>{}</title>\n\
         <meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\" />\n\
         </head>\n\
         <body>\n\
         {}\n\
         </body>\n\
         </html>\n",
        title, body
    )
}

/// The `hello` page.
pub fn hello(data: &str) -> String {
    page("Hello", &format!("<p>{}</p>", escape(data)))
}

/// The `hello-template` page. A missing name renders as empty.
pub fn hello_template(name: Option<&str>) -> String {
    let name = name.map(escape).unwrap_or_default();
    page("Hello", &format!("<p>hello {}</p>", name))
}
