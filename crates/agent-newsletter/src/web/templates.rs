//! HTML pages, rendered with minijinja
//!
//! Template names end in `.html`, so every value is HTML-escaped.

use minijinja::Environment;
use serde::Serialize;

const BASE: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>{% block title %}Stock Newsletter{% endblock %}</title>
  <style>
    body { font-family: sans-serif; display: flex; margin: 0; }
    aside { width: 18rem; padding: 1.5rem; background: #f3f4f6; min-height: 100vh; }
    main { flex: 1; padding: 1.5rem 2rem; }
    .error { color: #b91c1c; }
    .notice { color: #92400e; background: #fef3c7; padding: 0.5rem; }
    pre.newsletter { white-space: pre-wrap; font-family: inherit; }
    table { border-collapse: collapse; }
    td, th { border: 1px solid #d1d5db; padding: 0.25rem 0.5rem; text-align: left; }
  </style>
</head>
<body>
  <aside>
    <h2>Enter the Stock to Research</h2>
    <form method="post" action="/research">
      <label for="ticker">Select the ticker</label>
      <input id="ticker" name="ticker" value="{{ ticker }}" autocomplete="off">
      <button type="submit">Run Research</button>
    </form>
    {% if error %}<p class="error">{{ error }}</p>{% endif %}
  </aside>
  <main>{% block content %}{% endblock %}</main>
</body>
</html>
"#;

const INDEX: &str = r#"{% extends "base.html" %}
{% block content %}
<p>Enter a ticker and run the research to get a newsletter on its price trend and news.</p>
{% endblock %}
"#;

const RESULT: &str = r#"{% extends "base.html" %}
{% block title %}{{ ticker }} newsletter{% endblock %}
{% block content %}
<h1>Results of research:</h1>
<p>Price trend: <strong>{{ trend }}</strong></p>
{% for notice in degradations %}<p class="notice">{{ notice }}</p>
{% endfor %}
<pre class="newsletter">{{ markdown }}</pre>
<h2>News sentiment</h2>
<table>
  <tr><th>Asset</th><th>Summary</th><th>Forecast</th><th>Score</th></tr>
  {% for row in sentiment %}<tr><td>{{ row.asset }}</td><td>{{ row.summary }}</td><td>{{ row.forecast }}</td><td>{{ row.score }}</td></tr>
  {% endfor %}
</table>
<p><small>Run {{ run_id }}, {{ supervisor_iterations }} supervisor iterations</small></p>
{% endblock %}
"#;

const FAILURE: &str = r#"{% extends "base.html" %}
{% block content %}
<h1>Research failed</h1>
<p class="error">{{ message }}</p>
{% endblock %}
"#;

/// The compiled page templates
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("base.html", BASE)?;
        env.add_template("index.html", INDEX)?;
        env.add_template("result.html", RESULT)?;
        env.add_template("failure.html", FAILURE)?;
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_index_form() {
        let html = Pages::new().unwrap().render("index.html", context! {}).unwrap();
        assert!(html.contains("Select the ticker"));
        assert!(html.contains("Run Research"));
        assert!(!html.contains("class=\"error\""));
    }

    #[test]
    fn test_values_are_escaped() {
        let html = Pages::new()
            .unwrap()
            .render(
                "failure.html",
                context! { ticker => "<b>", message => "<script>alert(1)</script>" },
            )
            .unwrap();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("value=\"&lt;b&gt;\""));
    }
}
