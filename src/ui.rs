use crate::models::Book;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([A-Z_]+)\}\}").expect("placeholder pattern"));

pub struct IndexView<'a> {
    pub today: NaiveDate,
    pub books: &'a [Book],
    pub featured: Option<&'a Book>,
    pub chart_svg: Option<&'a str>,
}

pub fn render_index(view: &IndexView<'_>) -> String {
    let featured = match view.featured {
        Some(book) => format!(
            r#"<h2>{}</h2><p class="subtitle">{}</p>"#,
            escape(&book.title),
            escape(&book.description)
        ),
        None => r#"<p class="subtitle">Add a book to get started.</p>"#.to_string(),
    };

    let options = view
        .books
        .iter()
        .map(|book| format!(r#"<option value="{}">{}</option>"#, book.id, escape(&book.title)))
        .collect::<String>();

    let chart = view
        .chart_svg
        .unwrap_or(r#"<p class="subtitle">Chart unavailable.</p>"#);

    let today = view.today.to_string();
    // Single pass: substituted text is never scanned for placeholders again.
    PLACEHOLDER
        .replace_all(INDEX_HTML, |caps: &Captures<'_>| match &caps[1] {
            "TODAY" => today.clone(),
            "FEATURED" => featured.clone(),
            "BOOK_OPTIONS" => options.clone(),
            "CHART" => chart.to_string(),
            _ => caps[0].to_string(),
        })
        .into_owned()
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Writing Progress</title>
  <style>
    :root {
      --bg-1: #f8f3e6;
      --ink: #2b2a28;
      --accent: #ff6b4a;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.86);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, var(--bg-1), #ffe9d4 60%, #f9f2e9 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(860px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    .subtitle {
      margin: 0;
      color: #5f5c57;
    }

    .featured {
      display: flex;
      align-items: center;
      justify-content: space-between;
      gap: 16px;
    }

    form {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
    }

    input, select, button {
      font: inherit;
      border-radius: 999px;
      padding: 10px 16px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    button {
      background: var(--accent);
      color: white;
      border: none;
      cursor: pointer;
    }

    .chart-card {
      background: white;
      border-radius: 20px;
      padding: 16px;
      border: 1px solid rgba(47, 72, 88, 0.08);
    }

    .chart-card svg {
      width: 100%;
      display: block;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Writing Progress</h1>
      <p class="subtitle">Words written over the last 7 days.</p>
    </header>

    <section class="featured">
      <button type="button" data-featured="prev">&larr;</button>
      <div id="featured">{{FEATURED}}</div>
      <button type="button" data-featured="next">&rarr;</button>
    </section>

    <section class="chart-card" id="chart">{{CHART}}</section>

    <form id="observation">
      <input type="date" name="date" value="{{TODAY}}" required />
      <select name="book_id" required>{{BOOK_OPTIONS}}</select>
      <input type="number" name="total_words" min="0" placeholder="Words" required />
      <button type="submit">Record</button>
    </form>

    <form id="book">
      <input type="text" name="title" placeholder="New book title" required />
      <button type="submit">Add book</button>
    </form>
  </main>

  <script>
    const chartEl = document.getElementById('chart');
    const featuredEl = document.getElementById('featured');

    const refreshChart = async () => {
      const response = await fetch('/chart.svg', { cache: 'no-store' });
      if (response.ok) {
        chartEl.innerHTML = await response.text();
      }
    };

    const renderFeatured = (featured) => {
      featuredEl.replaceChildren();
      if (!featured.book) {
        const empty = document.createElement('p');
        empty.className = 'subtitle';
        empty.textContent = 'Add a book to get started.';
        featuredEl.append(empty);
        return;
      }
      const title = document.createElement('h2');
      title.textContent = featured.book.title;
      const description = document.createElement('p');
      description.className = 'subtitle';
      description.textContent = featured.book.description;
      featuredEl.append(title, description);
    };

    const refreshFeatured = async () => {
      const response = await fetch('/api/featured', { cache: 'no-store' });
      if (response.ok) {
        renderFeatured(await response.json());
      }
    };

    // One owned poll loop for everything the server changes on its own.
    const poller = {
      handle: null,
      periodMs: 3000,
      start() {
        if (this.handle !== null) {
          return;
        }
        this.handle = window.setInterval(() => {
          refreshFeatured();
          refreshChart();
        }, this.periodMs);
      },
      stop() {
        if (this.handle !== null) {
          window.clearInterval(this.handle);
          this.handle = null;
        }
      },
    };

    document.getElementById('observation').addEventListener('submit', async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      await fetch('/api/observations', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({
          date: form.get('date'),
          book_id: Number(form.get('book_id')),
          total_words: Number(form.get('total_words')),
        }),
      });
      await refreshChart();
    });

    document.getElementById('book').addEventListener('submit', async (event) => {
      event.preventDefault();
      const form = new FormData(event.target);
      await fetch('/api/books', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ title: form.get('title') }),
      });
      window.location.reload();
    });

    document.querySelectorAll('[data-featured]').forEach((button) => {
      button.addEventListener('click', async () => {
        const response = await fetch(`/api/featured/${button.dataset.featured}`, { method: 'POST' });
        if (response.ok) {
          renderFeatured(await response.json());
        }
      });
    });

    document.addEventListener('visibilitychange', () => {
      if (document.hidden) {
        poller.stop();
      } else {
        poller.start();
      }
    });
    window.addEventListener('pagehide', () => poller.stop());

    poller.start();
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_books_and_chart() {
        let books = vec![Book {
            id: 7,
            title: "<BTL>".to_string(),
            description: "A story".to_string(),
        }];
        let html = render_index(&IndexView {
            today: NaiveDate::from_ymd_opt(2025, 12, 23).unwrap(),
            books: &books,
            featured: books.first(),
            chart_svg: Some("<svg></svg>"),
        });

        assert!(html.contains(r#"<option value="7">&lt;BTL&gt;</option>"#));
        assert!(html.contains("<h2>&lt;BTL&gt;</h2>"));
        assert!(html.contains(r#"value="2025-12-23""#));
        assert!(html.contains("<svg></svg>"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn placeholders_in_user_text_are_not_expanded() {
        let books = vec![Book {
            id: 1,
            title: "{{CHART}}".to_string(),
            description: "{{BOOK_OPTIONS}}".to_string(),
        }];
        let html = render_index(&IndexView {
            today: NaiveDate::from_ymd_opt(2025, 12, 23).unwrap(),
            books: &books,
            featured: books.first(),
            chart_svg: Some("<svg>chart</svg>"),
        });

        assert!(html.contains("<h2>{{CHART}}</h2>"));
        assert!(html.contains(r#"<p class="subtitle">{{BOOK_OPTIONS}}</p>"#));
        assert_eq!(html.matches("<svg>chart</svg>").count(), 1);
    }

    #[test]
    fn page_drives_polling_from_one_owned_loop() {
        assert_eq!(INDEX_HTML.matches("setInterval").count(), 1);
        assert!(INDEX_HTML.contains("clearInterval"));
        assert!(INDEX_HTML.contains("/api/featured"));
    }
}
