//! Block parser.
//!
//! Consumes the line-token stream and produces raw block structure. The
//! open-container logic works over token ranges: blockquotes collect the run
//! of deeper-quoted lines and recurse; list items and footnote definitions
//! reassemble their stripped content and re-parse it as a fragment;
//! directives scan ahead for their closing fence with a nesting counter.
//!
//! Inline content is *not* parsed here: paragraphs, headings, and table
//! cells hold their raw text as a single `Text` child until the reference
//! definitions from the whole document are known (first label wins), and the
//! inline pass in [`super`] replaces them.

use patitas_syntax::{Lexer, ListMarkerKind, SourceLocation, Token, TokenKind};

use crate::ast::{
    Block, BlockQuote, CodeBody, Directive, DirectiveOptions, FencedCode, FootnoteDef, Heading,
    HtmlBlock, IndentedCode, Inline, List, ListItem, MathBlock, Paragraph, Table, TableCell,
    TableRow, Text, ThematicBreak,
};
use crate::config::ParseConfig;
use crate::directives::options::RawOptions;
use crate::error::{ContractViolation, RenderError};
use crate::parser::inline::normalize_label;
use crate::parser::{RefDefs, tables};
use crate::request::request;

pub(crate) struct BlockParser<'src, 'cfg> {
    source: &'src str,
    config: &'cfg ParseConfig,
    tokens: Vec<Token<'src>>,
    pub refdefs: RefDefs,
    pub violations: Vec<ContractViolation>,
    directive_stack: Vec<String>,
    apply_transform: bool,
}

/// Raw paragraph accumulator: trimmed-left lines (trailing spaces kept for
/// hard breaks) plus the location of the first one.
struct OpenParagraph {
    lines: Vec<String>,
    location: SourceLocation,
}

impl<'src, 'cfg> BlockParser<'src, 'cfg> {
    pub fn new(source: &'src str, config: &'cfg ParseConfig) -> Self {
        Self {
            source,
            config,
            tokens: Vec::new(),
            refdefs: RefDefs::new(),
            violations: Vec::new(),
            directive_stack: Vec::new(),
            apply_transform: true,
        }
    }

    pub fn run(&mut self) -> Vec<Block> {
        let transform = if self.apply_transform {
            self.config.text_transformer.clone()
        } else {
            None
        };
        self.tokens = Lexer::with_transform(self.source, transform).tokenize();
        self.parse_range(0, self.tokens.len(), 0, 0)
    }

    /// Parse tokens `[start, end)` at blockquote `depth` with `base` columns
    /// of container indentation already accounted for.
    fn parse_range(&mut self, start: usize, end: usize, depth: u8, base: usize) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        let mut para: Option<OpenParagraph> = None;
        let mut i = start;

        while i < end {
            let tok = &self.tokens[i];
            if tok.is_eof() {
                break;
            }

            // Container: deeper blockquote.
            if tok.quote_depth > depth {
                flush_paragraph(&mut blocks, &mut para);
                let location = tok.location;
                let (range_end, next) = self.collect_blockquote(i, end, depth);
                let children = self.parse_range(i, range_end, depth + 1, 0);
                blocks.push(Block::BlockQuote(BlockQuote { location, children }));
                i = next;
                continue;
            }

            if tok.is_blank() {
                flush_paragraph(&mut blocks, &mut para);
                i += 1;
                continue;
            }

            // Indented code: only when nothing is open to continue.
            if para.is_none()
                && tok.indent >= base + 4
                && !matches!(tok.kind, TokenKind::FenceOpen { .. })
            {
                let (block, next) = self.parse_indented_code(i, end, depth, base);
                blocks.push(block);
                i = next;
                continue;
            }

            match tok.kind.clone() {
                TokenKind::AtxHeading { level } => {
                    flush_paragraph(&mut blocks, &mut para);
                    blocks.push(atx_heading(level, tok.trimmed(), tok.location));
                    i += 1;
                }
                TokenKind::SetextUnderline { ch } => {
                    match para.take() {
                        Some(open) => blocks.push(setext_heading(ch, open)),
                        None => push_para_line(&mut para, tok),
                    }
                    i += 1;
                }
                TokenKind::ThematicBreak => {
                    // `---` under a paragraph is a setext h2, not a rule.
                    let all_dashes = tok.trimmed().chars().all(|c| c == '-');
                    match para.take() {
                        Some(open) if all_dashes => blocks.push(setext_heading('-', open)),
                        other => {
                            para = other;
                            flush_paragraph(&mut blocks, &mut para);
                            blocks.push(Block::ThematicBreak(ThematicBreak {
                                location: tok.location,
                            }));
                        }
                    }
                    i += 1;
                }
                TokenKind::FenceOpen { ch, len, info } => {
                    flush_paragraph(&mut blocks, &mut para);
                    let (block, next) = self.parse_fence(i, end, ch, len, info);
                    blocks.push(block);
                    i = next;
                }
                TokenKind::ListMarker { marker, .. } => {
                    // Ordered lists interrupt a paragraph only when they
                    // start at 1.
                    let interrupts = match marker {
                        ListMarkerKind::Bullet { .. } => true,
                        ListMarkerKind::Ordered { start, .. } => start == 1,
                    };
                    if para.is_some() && !interrupts {
                        push_para_line(&mut para, &self.tokens[i]);
                        i += 1;
                        continue;
                    }
                    flush_paragraph(&mut blocks, &mut para);
                    let (block, next) = self.parse_list(i, end, depth, base);
                    blocks.push(block);
                    i = next;
                }
                TokenKind::DirectiveOpen {
                    colons,
                    name,
                    title,
                } => {
                    flush_paragraph(&mut blocks, &mut para);
                    let (block, next) = self.parse_directive(i, end, depth, base, colons, &name, title);
                    blocks.push(block);
                    i = next;
                }
                TokenKind::DirectiveClose { .. } => {
                    // Stray closer: literal paragraph text.
                    push_para_line(&mut para, &self.tokens[i]);
                    i += 1;
                }
                TokenKind::HtmlBlockOpen { html_kind } => {
                    if para.is_some() && html_kind == 7 {
                        // Type 7 cannot interrupt a paragraph.
                        push_para_line(&mut para, &self.tokens[i]);
                        i += 1;
                        continue;
                    }
                    flush_paragraph(&mut blocks, &mut para);
                    let (block, next) = self.parse_html_block(i, end);
                    blocks.push(block);
                    i = next;
                }
                TokenKind::Text => {
                    if para.is_none() {
                        let trimmed = self.tokens[i].trimmed().to_string();
                        if self.try_refdef(&trimmed) {
                            i += 1;
                            continue;
                        }
                        if self.config.footnotes && trimmed.starts_with("[^") {
                            if let Some((block, next)) = self.parse_footnote_def(i, end, base) {
                                blocks.push(block);
                                i = next;
                                continue;
                            }
                        }
                        if self.config.math && trimmed.starts_with("$$") {
                            let (block, next) = self.parse_math_block(i, end);
                            blocks.push(block);
                            i = next;
                            continue;
                        }
                        if self.config.tables && tables::looks_like_table_row(&trimmed) {
                            if let Some((block, next)) = self.parse_table(i, end) {
                                blocks.push(block);
                                i = next;
                                continue;
                            }
                        }
                    }
                    push_para_line(&mut para, &self.tokens[i]);
                    i += 1;
                }
                // Fence-mode tokens never appear outside parse_fence, but
                // degrade to text rather than panic if they do.
                TokenKind::CodeLine
                | TokenKind::FenceClose
                | TokenKind::HtmlLine
                | TokenKind::Blank
                | TokenKind::Eof => {
                    push_para_line(&mut para, &self.tokens[i]);
                    i += 1;
                }
            }
        }

        flush_paragraph(&mut blocks, &mut para);
        blocks
    }

    /// Extent of a blockquote starting at `start`: the run of deeper-quoted
    /// lines plus lazy paragraph continuations. Returns (end, next).
    fn collect_blockquote(&self, start: usize, end: usize, depth: u8) -> (usize, usize) {
        let mut i = start;
        let mut last_was_text = false;
        while i < end {
            let tok = &self.tokens[i];
            if tok.is_eof() {
                break;
            }
            if tok.quote_depth > depth {
                if tok.is_blank() {
                    // A quoted blank stays inside the quote.
                    last_was_text = false;
                } else {
                    last_was_text = matches!(tok.kind, TokenKind::Text);
                }
                i += 1;
                continue;
            }
            // Lazy continuation: unquoted paragraph text directly after a
            // quoted paragraph line.
            if last_was_text && !tok.is_blank() && matches!(tok.kind, TokenKind::Text) {
                i += 1;
                continue;
            }
            break;
        }
        (i, i)
    }

    fn parse_indented_code(
        &self,
        start: usize,
        end: usize,
        depth: u8,
        base: usize,
    ) -> (Block, usize) {
        let location = self.tokens[start].location;
        let mut lines: Vec<String> = Vec::new();
        let mut pending_blanks = 0usize;
        let mut i = start;

        while i < end {
            let tok = &self.tokens[i];
            if tok.is_eof() || tok.quote_depth != depth {
                break;
            }
            if tok.is_blank() {
                pending_blanks += 1;
                i += 1;
                continue;
            }
            if tok.indent >= base + 4 && !matches!(tok.kind, TokenKind::FenceOpen { .. }) {
                for _ in 0..pending_blanks {
                    lines.push(String::new());
                }
                pending_blanks = 0;
                lines.push(tok.strip_columns(base + 4).to_string());
                i += 1;
                continue;
            }
            break;
        }
        // Trailing blanks belong to whatever follows.
        let next = i - pending_blanks;
        let mut code = lines.join("\n");
        code.push('\n');
        (Block::IndentedCode(IndentedCode { location, code }), next)
    }

    fn parse_fence(
        &mut self,
        start: usize,
        end: usize,
        ch: char,
        len: usize,
        info: String,
    ) -> (Block, usize) {
        let open = &self.tokens[start];
        let location = open.location;
        let contiguous = open.quote_depth == 0 && open.indent == 0;

        let mut j = start + 1;
        while j < end && matches!(self.tokens[j].kind, TokenKind::CodeLine) {
            j += 1;
        }
        let closed = j < end && matches!(self.tokens[j].kind, TokenKind::FenceClose);

        let body = if contiguous {
            let body_start = if start + 1 < self.tokens.len() {
                self.tokens[start + 1].span.start
            } else {
                self.source.len()
            };
            let body_end = if j < self.tokens.len() {
                self.tokens[j].span.start
            } else {
                self.source.len()
            };
            CodeBody::Span(patitas_syntax::SourceSpan::new(
                body_start.min(body_end),
                body_end,
            ))
        } else {
            let mut content = String::new();
            for tok in &self.tokens[start + 1..j] {
                content.push_str(&tok.text);
                content.push('\n');
            }
            CodeBody::Owned(content)
        };

        (
            Block::FencedCode(FencedCode {
                location,
                info,
                body,
                fence_char: ch,
                fence_len: len,
            }),
            if closed { j + 1 } else { j },
        )
    }

    fn parse_html_block(&self, start: usize, end: usize) -> (Block, usize) {
        let location = self.tokens[start].location;
        let mut html = String::new();
        html.push_str(&self.tokens[start].text);
        html.push('\n');
        let mut i = start + 1;
        while i < end && matches!(self.tokens[i].kind, TokenKind::HtmlLine) {
            html.push_str(&self.tokens[i].text);
            html.push('\n');
            i += 1;
        }
        (Block::HtmlBlock(HtmlBlock { location, html }), i)
    }

    fn parse_math_block(&self, start: usize, end: usize) -> (Block, usize) {
        let location = self.tokens[start].location;
        let first = self.tokens[start].trimmed();

        // Single-line form: $$content$$
        if first.len() > 4 && first.ends_with("$$") {
            let content = first[2..first.len() - 2].trim().to_string();
            return (Block::MathBlock(MathBlock { location, content }), start + 1);
        }

        let mut lines: Vec<String> = Vec::new();
        let opener_rest = first[2..].trim();
        if !opener_rest.is_empty() {
            lines.push(opener_rest.to_string());
        }
        let mut i = start + 1;
        while i < end {
            let tok = &self.tokens[i];
            if tok.is_eof() {
                break;
            }
            let trimmed = tok.text.trim();
            if trimmed == "$$" {
                i += 1;
                break;
            }
            if let Some(last) = trimmed.strip_suffix("$$") {
                lines.push(last.trim_end().to_string());
                i += 1;
                break;
            }
            lines.push(trimmed.to_string());
            i += 1;
        }
        (
            Block::MathBlock(MathBlock {
                location,
                content: lines.join("\n"),
            }),
            i,
        )
    }

    fn parse_footnote_def(&mut self, start: usize, end: usize, base: usize) -> Option<(Block, usize)> {
        let tok = &self.tokens[start];
        let location = tok.location;
        let trimmed = tok.trimmed();
        let rest = trimmed.strip_prefix("[^")?;
        let close = rest.find("]:")?;
        let identifier = rest[..close].trim().to_string();
        if identifier.is_empty() || identifier.contains(' ') {
            return None;
        }
        let first_line = rest[close + 2..].trim_start().to_string();

        let mut lines = vec![first_line];
        let mut pending_blanks = 0usize;
        let mut i = start + 1;
        while i < end {
            let t = &self.tokens[i];
            if t.is_eof() {
                break;
            }
            if t.is_blank() {
                pending_blanks += 1;
                i += 1;
                continue;
            }
            if t.indent >= base + 4 {
                for _ in 0..pending_blanks {
                    lines.push(String::new());
                }
                pending_blanks = 0;
                lines.push(t.strip_columns(base + 4).to_string());
                i += 1;
                continue;
            }
            break;
        }
        let i = i - pending_blanks;

        let content = lines.join("\n");
        let children = self.parse_fragment(&content);
        Some((
            Block::FootnoteDef(FootnoteDef {
                location,
                identifier,
                children,
            }),
            i,
        ))
    }

    fn parse_table(&mut self, start: usize, end: usize) -> Option<(Block, usize)> {
        if start + 1 >= end {
            return None;
        }
        let delim_tok = &self.tokens[start + 1];
        if !matches!(delim_tok.kind, TokenKind::Text | TokenKind::SetextUnderline { .. })
            || delim_tok.quote_depth != self.tokens[start].quote_depth
        {
            return None;
        }
        let alignments = tables::parse_delimiter_row(delim_tok.text.trim())?;
        let head_cells = tables::split_row(self.tokens[start].trimmed());
        if head_cells.len() != alignments.len() {
            return None;
        }

        let location = self.tokens[start].location;
        let head = vec![raw_row(head_cells)];

        let mut body = Vec::new();
        let mut i = start + 2;
        while i < end {
            let tok = &self.tokens[i];
            if tok.is_eof()
                || tok.is_blank()
                || !matches!(tok.kind, TokenKind::Text)
                || !tables::looks_like_table_row(tok.trimmed())
            {
                break;
            }
            let mut cells = tables::split_row(tok.trimmed());
            // Normalize row width to the header.
            cells.truncate(alignments.len());
            while cells.len() < alignments.len() {
                cells.push(String::new());
            }
            body.push(raw_row(cells));
            i += 1;
        }

        Some((
            Block::Table(Table {
                location,
                alignments,
                head,
                body,
            }),
            i,
        ))
    }

    fn parse_list(&mut self, list_start: usize, end: usize, depth: u8, base: usize) -> (Block, usize) {
        let location = self.tokens[list_start].location;
        let TokenKind::ListMarker {
            marker: first_marker,
            ..
        } = self.tokens[list_start].kind.clone()
        else {
            // Not a marker after all; degrade to a one-line paragraph.
            let text = self.tokens[list_start].trimmed().to_string();
            return (
                Block::Paragraph(Paragraph {
                    location,
                    children: vec![Inline::Text(Text { content: text })],
                }),
                list_start + 1,
            );
        };
        let (ordered, start_number) = match first_marker {
            ListMarkerKind::Bullet { .. } => (false, 1),
            ListMarkerKind::Ordered { start, .. } => (true, start),
        };

        let mut items: Vec<ListItem> = Vec::new();
        let mut loose = false;
        let mut i = list_start;

        loop {
            let tok = self.tokens[i].clone();
            let TokenKind::ListMarker { marker, width } = tok.kind.clone() else {
                break;
            };
            let content_col = tok.indent + width;
            let item_location = tok.location;

            // First-line content, after the marker and its spacing.
            let trimmed = tok.trimmed();
            let marker_len = match marker {
                ListMarkerKind::Bullet { .. } => 1,
                ListMarkerKind::Ordered { .. } => {
                    trimmed.chars().take_while(|c| c.is_ascii_digit()).count() + 1
                }
            };
            let after_marker = &trimmed[marker_len..];
            let spaces = after_marker.chars().take_while(|c| *c == ' ').count();
            let skip = spaces.min(width - marker_len);
            let mut first_line = &after_marker[skip..];

            let mut checked = None;
            if self.config.task_lists {
                for (prefix, state) in [("[ ]", false), ("[x]", true), ("[X]", true)] {
                    if let Some(rest) = first_line.strip_prefix(prefix) {
                        if rest.is_empty() || rest.starts_with(' ') {
                            checked = Some(state);
                            first_line = rest.trim_start_matches(' ');
                            break;
                        }
                    }
                }
            }

            let mut lines: Vec<String> = vec![first_line.to_string()];
            let mut pending_blanks = 0usize;
            let mut next_item: Option<usize> = None;
            i += 1;

            while i < end {
                let t = &self.tokens[i];
                if t.is_eof() {
                    break;
                }
                if t.is_blank() {
                    pending_blanks += 1;
                    i += 1;
                    continue;
                }
                if t.quote_depth > depth {
                    if pending_blanks > 0 {
                        break;
                    }
                    let prefix = "> ".repeat((t.quote_depth - depth) as usize);
                    lines.push(format!("{prefix}{}", t.text));
                    i += 1;
                    continue;
                }
                if matches!(t.kind, TokenKind::CodeLine) {
                    // Fence body inside the item; already stripped to the
                    // opening fence's indent.
                    lines.push(t.text.to_string());
                    i += 1;
                    continue;
                }
                if t.indent >= content_col {
                    if pending_blanks > 0 {
                        for _ in 0..pending_blanks {
                            lines.push(String::new());
                        }
                        pending_blanks = 0;
                        loose = true;
                    }
                    lines.push(t.strip_columns(content_col).to_string());
                    i += 1;
                    continue;
                }
                // Shallower than the item content: same-level marker, lazy
                // continuation, or the end of the list.
                if let TokenKind::ListMarker {
                    marker: next_marker,
                    ..
                } = t.kind
                {
                    if t.indent >= base && markers_compatible(first_marker, next_marker) {
                        if pending_blanks > 0 {
                            loose = true;
                        }
                        next_item = Some(i);
                    }
                    break;
                }
                if pending_blanks == 0 && matches!(t.kind, TokenKind::Text) {
                    lines.push(t.trimmed().to_string());
                    i += 1;
                    continue;
                }
                break;
            }

            let content = lines.join("\n");
            let children = self.parse_fragment(&content);
            items.push(ListItem {
                location: item_location,
                checked,
                children,
            });

            match next_item {
                Some(j) => i = j,
                None => break,
            }
        }

        (
            Block::List(List {
                location,
                ordered,
                start: start_number,
                tight: !loose,
                items,
            }),
            i,
        )
    }

    fn parse_directive(
        &mut self,
        start: usize,
        end: usize,
        depth: u8,
        base: usize,
        colons: usize,
        name: &str,
        title: Option<String>,
    ) -> (Block, usize) {
        let location = self.tokens[start].location;

        // Find our closing fence, tracking nested directive fences.
        let mut nesting = 0usize;
        let mut body_end = end;
        let mut close_idx: Option<usize> = None;
        let mut j = start + 1;
        while j < end {
            match &self.tokens[j].kind {
                TokenKind::Eof => break,
                TokenKind::DirectiveOpen { .. } => nesting += 1,
                TokenKind::DirectiveClose {
                    colons: close_colons,
                    name: close_name,
                } => {
                    let names_match = close_name.as_deref() == Some(name);
                    if nesting == 0 && (names_match || (close_name.is_none() && *close_colons >= colons)) {
                        body_end = j;
                        close_idx = Some(j);
                        break;
                    }
                    if nesting > 0 {
                        nesting -= 1;
                    }
                }
                _ => {}
            }
            j += 1;
        }
        if close_idx.is_none() {
            body_end = j.min(end);
        }

        // Option lines sit immediately under the opener.
        let mut raw = RawOptions::default();
        let mut content_start = start + 1;
        while content_start < body_end {
            let tok = &self.tokens[content_start];
            if !matches!(tok.kind, TokenKind::Text) {
                break;
            }
            match parse_option_line(tok.trimmed()) {
                Some((key, value)) => {
                    raw.insert(key, value);
                    content_start += 1;
                }
                None => break,
            }
        }

        // Parse children with this directive as the open parent.
        self.directive_stack.push(name.to_string());
        let children = self.parse_range(content_start, body_end, depth, base);
        self.directive_stack.pop();

        let parent = self.directive_stack.last().cloned();
        let registry = self.config.directive_registry.clone();
        let handler = registry.as_ref().and_then(|r| r.get(name)).cloned();

        let node = match handler {
            Some(handler) => {
                if let Some(contract) = handler.contract() {
                    if let Some(violation) =
                        contract.validate_parent(name, parent.as_deref(), location)
                    {
                        self.record_violation(violation);
                    }
                    for violation in contract.validate_children(name, &children, location) {
                        self.record_violation(violation);
                    }
                }
                let typed = handler.parse_options(&raw);
                handler.parse(
                    name,
                    title.as_deref(),
                    DirectiveOptions::with_typed(raw, typed),
                    children,
                    location,
                )
            }
            None => Directive {
                location,
                name: name.to_string(),
                title,
                options: DirectiveOptions::from_raw(raw),
                children,
            },
        };

        let next = match close_idx {
            Some(idx) => idx + 1,
            None => body_end,
        };
        (Block::Directive(node), next)
    }

    /// Try to consume a link reference definition. First label wins.
    fn try_refdef(&mut self, trimmed: &str) -> bool {
        let Some((label, url, title)) = parse_refdef(trimmed) else {
            return false;
        };
        let key = normalize_label(&label);
        self.refdefs.entry(key).or_insert((url, title));
        true
    }

    fn record_violation(&mut self, violation: ContractViolation) {
        request::report(RenderError::Contract(violation.clone()), "directive parse");
        tracing::debug!(
            directive = %violation.directive,
            line = violation.line,
            "directive contract violation"
        );
        self.violations.push(violation);
    }

    /// Re-parse reassembled container content (list items, footnote bodies).
    /// Fragment spans index the fragment buffer, so span-backed code bodies
    /// are converted to owned content before they escape.
    pub(crate) fn parse_fragment(&mut self, content: &str) -> Vec<Block> {
        if content.trim().is_empty() {
            return Vec::new();
        }
        let mut sub = BlockParser {
            source: content,
            config: self.config,
            tokens: Vec::new(),
            refdefs: std::mem::take(&mut self.refdefs),
            violations: Vec::new(),
            directive_stack: self.directive_stack.clone(),
            apply_transform: false,
        };
        let mut blocks = sub.run();
        self.refdefs = std::mem::take(&mut sub.refdefs);
        self.violations.append(&mut sub.violations);
        own_code_bodies(&mut blocks, content);
        blocks
    }
}

fn raw_row(cells: Vec<String>) -> TableRow {
    TableRow {
        cells: cells
            .into_iter()
            .map(|raw| TableCell {
                children: vec![Inline::Text(Text { content: raw })],
            })
            .collect(),
    }
}

fn markers_compatible(a: ListMarkerKind, b: ListMarkerKind) -> bool {
    match (a, b) {
        (ListMarkerKind::Bullet { ch: a }, ListMarkerKind::Bullet { ch: b }) => a == b,
        (ListMarkerKind::Ordered { delim: a, .. }, ListMarkerKind::Ordered { delim: b, .. }) => {
            a == b
        }
        _ => false,
    }
}

fn flush_paragraph(blocks: &mut Vec<Block>, para: &mut Option<OpenParagraph>) {
    if let Some(open) = para.take() {
        let raw = open.lines.join("\n");
        blocks.push(Block::Paragraph(Paragraph {
            location: open.location,
            children: vec![Inline::Text(Text { content: raw })],
        }));
    }
}

fn push_para_line(para: &mut Option<OpenParagraph>, tok: &Token<'_>) {
    let line = tok.text.trim_start_matches([' ', '\t']);
    match para {
        Some(open) => open.lines.push(line.to_string()),
        None => {
            *para = Some(OpenParagraph {
                lines: vec![line.to_string()],
                location: tok.location,
            });
        }
    }
}

/// `# Heading ## {#custom-id}` → level, text, explicit id.
fn atx_heading(level: u8, trimmed: &str, location: SourceLocation) -> Block {
    let after = trimmed[level as usize..].trim_start_matches([' ', '\t']);
    let mut text = after.trim_end_matches([' ', '\t']);

    // Optional closing sequence of #'s.
    let without_close = text.trim_end_matches('#');
    if without_close.len() < text.len()
        && (without_close.is_empty() || without_close.ends_with([' ', '\t']))
    {
        text = without_close.trim_end_matches([' ', '\t']);
    }

    let (text, explicit_id) = split_explicit_id(text);
    Block::Heading(Heading {
        location,
        level,
        explicit_id,
        children: vec![Inline::Text(Text {
            content: text.to_string(),
        })],
    })
}

fn setext_heading(ch: char, open: OpenParagraph) -> Block {
    let raw = open.lines.join("\n");
    let (text, explicit_id) = split_explicit_id(raw.trim());
    Block::Heading(Heading {
        location: open.location,
        level: if ch == '=' { 1 } else { 2 },
        explicit_id,
        children: vec![Inline::Text(Text {
            content: text.to_string(),
        })],
    })
}

/// Trailing `{#custom-id}` on a heading.
fn split_explicit_id(text: &str) -> (&str, Option<String>) {
    let trimmed = text.trim_end();
    if let Some(open) = trimmed.rfind("{#") {
        if let Some(body) = trimmed[open + 2..].strip_suffix('}') {
            let valid = !body.is_empty()
                && body
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if valid && !trimmed[open..].contains(' ') {
                return (trimmed[..open].trim_end(), Some(body.to_string()));
            }
        }
    }
    (trimmed, None)
}

/// `:key: value` directive option line.
fn parse_option_line(trimmed: &str) -> Option<(&str, &str)> {
    let rest = trimmed.strip_prefix(':')?;
    let close = rest.find(':')?;
    let key = &rest[..close];
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return None;
    }
    Some((key, rest[close + 1..].trim()))
}

/// `[label]: destination "title"` on one line.
fn parse_refdef(trimmed: &str) -> Option<(String, String, Option<String>)> {
    let rest = trimmed.strip_prefix('[')?;
    if rest.starts_with('^') {
        return None; // footnote definition, not a link label
    }
    let close = rest.find(']')?;
    let label = &rest[..close];
    if label.is_empty() || label.contains('[') {
        return None;
    }
    let after = rest[close + 1..].strip_prefix(':')?;
    let after = after.trim_start();
    if after.is_empty() {
        return None;
    }

    let (url, remainder) = if let Some(inner) = after.strip_prefix('<') {
        let end = inner.find('>')?;
        (inner[..end].to_string(), inner[end + 1..].trim_start())
    } else {
        let end = after.find([' ', '\t']).unwrap_or(after.len());
        (after[..end].to_string(), after[end..].trim_start())
    };

    let title = if remainder.is_empty() {
        None
    } else {
        let quote = remainder.chars().next()?;
        if !matches!(quote, '"' | '\'' | '(') {
            return None;
        }
        let close_ch = if quote == '(' { ')' } else { quote };
        let body = &remainder[1..];
        let end = body.find(close_ch)?;
        if !body[end + 1..].trim().is_empty() {
            return None;
        }
        Some(body[..end].to_string())
    };

    Some((label.to_string(), url, title))
}

/// Convert span-backed fence bodies to owned content; used when the spans
/// index a reassembled fragment buffer rather than the original source.
fn own_code_bodies(blocks: &mut [Block], fragment: &str) {
    for block in blocks {
        match block {
            Block::FencedCode(node) => {
                if let CodeBody::Span(span) = &node.body {
                    let owned = span.slice(fragment).to_string();
                    node.body = CodeBody::Owned(owned);
                }
            }
            Block::BlockQuote(node) => own_code_bodies(&mut node.children, fragment),
            Block::List(node) => {
                for item in &mut node.items {
                    own_code_bodies(&mut item.children, fragment);
                }
            }
            Block::FootnoteDef(node) => own_code_bodies(&mut node.children, fragment),
            Block::Directive(node) => own_code_bodies(&mut node.children, fragment),
            _ => {}
        }
    }
}
