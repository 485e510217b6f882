//! Stylesheets for the rendered view
//!
//! The base stylesheet reads the theme through `--theme-*` custom
//! properties. It never declares `@page`: page geometry for PDF output
//! comes from the print options alone.

use super::Theme;

/// Element id of the temporary PDF theme override
pub const PDF_THEME_OVERRIDE_ID: &str = "pdf-theme-override";

/// Stylesheet installed in the head of every view
pub fn base_stylesheet() -> String {
    format!("{}{}{}{}", SCREEN_CSS, EMBED_CSS, PAGINATION_CSS, PRINT_CSS)
}

const SCREEN_CSS: &str = r#"
* {
    box-sizing: border-box;
}

html, body {
    background-color: var(--theme-body);
}

#content {
    background-color: var(--theme-content);
}

#markdown-content {
    max-width: 900px;
    margin: 0 auto;
    padding: 2rem;
    color: var(--theme-text);
}

#markdown-content h1, #markdown-content h2, #markdown-content h3,
#markdown-content h4, #markdown-content h5, #markdown-content h6 {
    color: var(--theme-heading);
    margin-top: 24px;
    margin-bottom: 16px;
    font-weight: 600;
    line-height: 1.25;
}

#markdown-content h1 { font-size: 2em; padding-bottom: .3em; }
#markdown-content h2 { font-size: 1.5em; padding-bottom: .3em; }
#markdown-content h3 { font-size: 1.25em; }
#markdown-content h4 { font-size: 1em; }
#markdown-content h5 { font-size: .875em; }
#markdown-content h6 { font-size: .85em; }

#markdown-content a {
    color: var(--theme-link);
    text-decoration: none;
}

#markdown-content code {
    background-color: var(--theme-code-bg);
    color: var(--theme-code-text);
    padding: .2em .4em;
    border-radius: 6px;
    font-size: 85%;
}

#markdown-content pre {
    background-color: var(--theme-code-bg);
    padding: 16px;
    overflow: auto;
    border-radius: 6px;
    line-height: 1.45;
}

#markdown-content pre code {
    background: transparent;
    padding: 0;
    font-size: 100%;
}

#markdown-content blockquote {
    margin: 16px 0;
    padding: 0 1em;
    background-color: var(--theme-quote-bg);
    color: var(--theme-quote-text);
    border-left: .25em solid var(--theme-quote-border);
}

#markdown-content table {
    border-collapse: collapse;
    width: 100%;
    margin: 16px 0;
}

#markdown-content table th,
#markdown-content table td {
    padding: 6px 13px;
    border: 1px solid var(--theme-quote-border);
}

#markdown-content table th {
    font-weight: 600;
    background-color: var(--theme-code-bg);
}

#markdown-content mjx-container[display="inline"],
#markdown-content .math-inline {
    margin: 0 0.2em;
}

#markdown-content .math-display {
    display: block;
    text-align: center;
    margin: 1em 0;
}

#markdown-content .render-error {
    color: #d32f2f;
    font-family: monospace;
    white-space: pre-wrap;
}

#markdown-content .mermaid-diagram svg,
#markdown-content .uml-sequence-diagram svg {
    max-width: 100%;
    height: auto;
}

#toc-sidebar {
    width: 260px;
    float: left;
    height: 100vh;
    overflow-y: auto;
}

.toc-item { display: block; padding: 2px 8px; }
.toc-item.level-2 { padding-left: 20px; }
.toc-item.level-3 { padding-left: 32px; }
.toc-item.level-4 { padding-left: 44px; }
.toc-item.level-5 { padding-left: 56px; }
.toc-item.level-6 { padding-left: 68px; }
.toc-empty { opacity: 0.6; padding: 8px; }
"#;

const EMBED_CSS: &str = r#"
#markdown-content img {
    max-width: calc(var(--image-scale, 1) * 100%);
    max-height: 80vh;
    height: auto;
    width: auto;
    display: block;
    margin: 12px auto;
}

.resizable-image {
    position: relative;
    display: inline-block;
    margin: 12px auto;
}

.resizable-image img {
    display: block;
    width: 100%;
    height: auto;
}

.resize-handle {
    position: absolute;
    right: 0;
    bottom: 0;
    width: 14px;
    height: 14px;
    background: rgba(255,255,255,0.7);
    border: 1px solid rgba(0,0,0,0.25);
    border-radius: 2px;
    cursor: nwse-resize;
}
"#;

const PAGINATION_CSS: &str = r#"
.pagedjs_pages {
    display: flex;
    flex-direction: column;
    align-items: center;
    gap: 24px;
    padding: 24px 0;
}

.pagedjs_page {
    background-color: var(--theme-content);
    box-shadow: 0 2px 8px rgba(0,0,0,0.3);
    padding-top: var(--pd-margin-top);
    padding-right: var(--pd-margin-right);
    padding-bottom: var(--pd-margin-bottom);
    padding-left: var(--pd-margin-left);
    overflow: hidden;
}
"#;

const PRINT_CSS: &str = r#"
@media print {
    * {
        -webkit-print-color-adjust: exact !important;
        print-color-adjust: exact !important;
        color-adjust: exact !important;
    }

    html, body {
        height: auto !important;
        overflow: visible !important;
        margin: 0 !important;
        padding: 0 !important;
    }

    #toc-sidebar { display: none !important; }

    #content {
        padding: 0 !important;
        margin: 0 !important;
        height: auto !important;
        overflow: visible !important;
        max-height: none !important;
    }

    #markdown-content {
        max-width: none !important;
        width: 100% !important;
        margin: 0 !important;
        padding: 0 !important;
        height: auto !important;
        overflow: visible !important;
    }

    .pagedjs_pages { display: block; padding: 0; gap: 0; }
    .pagedjs_page { box-shadow: none; padding: 0; break-after: page; }

    h1 { break-before: auto; break-after: avoid; }

    h2, h3, h4, h5, h6 {
        break-after: avoid;
        break-inside: avoid;
    }

    p, li {
        break-inside: avoid;
        orphans: 3;
        widows: 3;
    }

    ul, ol { break-inside: auto; }

    pre, code, blockquote, table, mjx-container {
        break-inside: avoid;
    }

    img {
        max-width: 100% !important;
        break-inside: avoid;
    }

    .resize-handle { display: none !important; }

    .mermaid-diagram, .uml-sequence-diagram {
        break-inside: avoid;
        text-align: center;
        max-height: none !important;
        overflow: visible !important;
    }

    .mermaid-diagram svg, .uml-sequence-diagram svg {
        max-width: 100% !important;
        height: auto !important;
        width: auto !important;
    }
}
"#;

/// Print-only colours for `theme`, injected for the duration of an export
pub fn print_override_css(theme: Theme) -> String {
    let p = theme.palette();
    format!(
        r#"
@media print {{
    html, body, #content, #markdown-content, .pagedjs_page {{
        background-color: {content} !important;
        color: {text} !important;
    }}
    #markdown-content h1, #markdown-content h2, #markdown-content h3,
    #markdown-content h4, #markdown-content h5, #markdown-content h6 {{
        color: {heading} !important;
    }}
    #markdown-content a {{ color: {link} !important; }}
    #markdown-content code {{
        background-color: {code_bg} !important;
        color: {code_text} !important;
    }}
    #markdown-content pre {{ background-color: {code_bg} !important; }}
    #markdown-content blockquote {{
        background-color: {quote_bg} !important;
        border-color: {quote_border} !important;
        color: {quote_text} !important;
    }}
}}
"#,
        content = p.content,
        text = p.text,
        heading = p.heading,
        link = p.link,
        code_bg = p.code_bg,
        code_text = p.code_text,
        quote_bg = p.quote_bg,
        quote_border = p.quote_border,
        quote_text = p.quote_text,
    )
}
