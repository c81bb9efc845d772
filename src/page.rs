use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::models::{ControllerSnapshot, GenerationResult, LengthCategory};

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; margin: 0; background: #f1f5f9; }
    main { max-width: 720px; margin: 40px auto; background: #fff; padding: 24px 32px; border-radius: 8px; }
    label { display: block; font-weight: bold; margin-top: 16px; }
    input, select { width: 100%; padding: 8px; margin-top: 4px; box-sizing: border-box; }
    #credential { font-family: monospace; }
    button { width: 100%; margin-top: 20px; padding: 10px; background: #2563eb; color: #fff; border: 0; border-radius: 4px; }
    button:disabled { background: #94a3b8; }
    .notice { background-color: #fef3c7; padding: 10px; margin-top: 16px; border-radius: 4px; }
    .error { background-color: #fee2e2; padding: 10px; margin-top: 16px; border-radius: 4px; }
    .article { white-space: pre-wrap; line-height: 1.5; }
"#;

// Drives the JSON API so the button can show the loading state. Model output
// is only ever assigned through textContent.
const SCRIPT: &str = r#"
    const form = document.getElementById('generate-form');
    const button = document.getElementById('submit');
    const output = document.getElementById('output');
    let submitting = button.dataset.submitting === 'true';
    const field = (id) => document.getElementById(id).value;

    function complete() {
        return ['credential', 'topic', 'length'].every((id) => field(id).trim() !== '');
    }

    function refresh() {
        button.disabled = submitting || !complete();
        button.textContent = submitting ? 'Generating...' : 'Generate Article';
    }

    function show(result) {
        output.replaceChildren();
        if (!result || result.status === 'pending') {
            return;
        }
        const box = document.createElement('div');
        if (result.status === 'success') {
            const heading = document.createElement('h3');
            heading.textContent = 'Generated Article:';
            box.className = 'article';
            box.textContent = result.text;
            output.append(heading);
        } else {
            box.className = 'error';
            box.textContent = result.text;
        }
        output.append(box);
    }

    form.addEventListener('input', refresh);
    form.addEventListener('submit', async (event) => {
        event.preventDefault();
        if (submitting || !complete()) {
            return;
        }
        submitting = true;
        refresh();
        try {
            const response = await fetch('/api/generate', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({
                    credential: field('credential'),
                    topic: field('topic'),
                    length: field('length'),
                }),
            });
            const body = await response.json();
            if (response.ok) {
                show(body.result);
            } else {
                show({ status: 'failure', text: body.error });
            }
        } catch (error) {
            show({ status: 'failure', text: 'Could not reach the server.' });
        } finally {
            submitting = false;
            refresh();
        }
    });
    refresh();
"#;

/// Renders the whole form page for the given controller state.
///
/// The credential input is never pre-filled. `notice` is shown above the
/// result, for problems with the submission itself.
pub fn render_page(snapshot: &ControllerSnapshot, notice: Option<&str>) -> String {
    let submitting = matches!(snapshot.result, Some(GenerationResult::Pending));

    let mut options = String::from(r#"<option value="">Select length</option>"#);
    for category in LengthCategory::ALL {
        let selected = if snapshot.length == Some(category) {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            category.as_str(),
            selected,
            category.display_name()
        ));
    }

    let notice = notice
        .map(|text| format!(r#"<div class="notice">{}</div>"#, encode_text(text)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>AI Article Generator</title>
    <meta charset="utf-8">
    <style>{style}</style>
</head>
<body>
<main>
    <h1>AI Article Generator</h1>
    <form id="generate-form" method="post" action="/generate">
        <label for="credential">OpenAI API Key</label>
        <input id="credential" name="credential" type="password" placeholder="sk-..." autocomplete="off">

        <label for="topic">Topic</label>
        <input id="topic" name="topic" placeholder="Enter article topic" value="{topic}">

        <label for="length">Essay Length</label>
        <select id="length" name="length">{options}</select>

        <button id="submit" type="submit" data-submitting="{submitting}"{disabled}>{label}</button>
    </form>
    {notice}
    <div id="output">{output}</div>
</main>
<script>{script}</script>
</body>
</html>
"#,
        style = STYLE,
        topic = encode_double_quoted_attribute(&snapshot.topic),
        options = options,
        submitting = submitting,
        disabled = if submitting { " disabled" } else { "" },
        label = if submitting {
            "Generating..."
        } else {
            "Generate Article"
        },
        notice = notice,
        output = render_result(snapshot.result.as_ref()),
        script = SCRIPT,
    )
}

fn render_result(result: Option<&GenerationResult>) -> String {
    match result {
        None | Some(GenerationResult::Pending) => String::new(),
        Some(GenerationResult::Success(text)) => format!(
            r#"<h3>Generated Article:</h3><div class="article">{}</div>"#,
            encode_text(text)
        ),
        Some(GenerationResult::Failure(message)) => {
            format!(r#"<div class="error">{}</div>"#, encode_text(message))
        }
    }
}
