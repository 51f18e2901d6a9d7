//! Server rendered index page

use std::fmt::Write;

use crate::database::types::LeaderboardEntry;

pub(super) struct IndexPage<'a> {
    pub(super) username: Option<&'a str>,
    pub(super) flashes: &'a [String],
    pub(super) leaderboard: &'a [LeaderboardEntry],
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl IndexPage<'_> {
    pub(super) fn render(&self) -> String {
        let mut html = String::from(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
             <title>Whack-a-Mole</title>\n</head>\n<body>\n<h1>Whack-a-Mole</h1>\n",
        );

        if !self.flashes.is_empty() {
            html.push_str("<ul class=\"flashes\">\n");
            for message in self.flashes {
                let _ = writeln!(html, "<li>{}</li>", escape_html(message));
            }
            html.push_str("</ul>\n");
        }

        match self.username {
            Some(username) => {
                let _ = write!(
                    html,
                    "<section id=\"account\" data-logged-in=\"true\">\n\
                     <p>Logged in as <strong>{}</strong></p>\n\
                     <form method=\"post\" action=\"/logout\"><button type=\"submit\">Log out</button></form>\n\
                     </section>\n\
                     <section id=\"game\" data-submit-url=\"/submit_score\"></section>\n",
                    escape_html(username)
                );
            }
            None => {
                html.push_str(
                    "<section id=\"account\" data-logged-in=\"false\">\n\
                     <form method=\"post\" action=\"/login\">\n\
                     <input name=\"username\" placeholder=\"Username\">\n\
                     <input name=\"password\" type=\"password\" placeholder=\"Password\">\n\
                     <button type=\"submit\">Log in</button>\n\
                     <button type=\"submit\" formaction=\"/register\">Register</button>\n\
                     </form>\n</section>\n",
                );
            }
        }

        html.push_str("<section id=\"leaderboard\">\n<h2>Leaderboard</h2>\n");
        if self.leaderboard.is_empty() {
            html.push_str("<p>No scores yet</p>\n");
        } else {
            html.push_str("<ol>\n");
            for entry in self.leaderboard {
                let _ = writeln!(
                    html,
                    "<li><span class=\"username\">{}</span> <span class=\"score\">{}</span></li>",
                    escape_html(&entry.username),
                    entry.score
                );
            }
            html.push_str("</ol>\n");
        }
        html.push_str("</section>\n</body>\n</html>\n");

        html
    }
}
