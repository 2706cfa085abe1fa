use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{
        Block, Borders, Cell, Clear, Gauge, List, ListItem, Paragraph, Row, Sparkline, Table, Tabs,
        Wrap,
    },
};

use super::{App, ConfirmAction};
use crate::Platform;
use crate::dashboard::{HubFocus, HubScreen, Loadable, Route, SettingsTab};
use crate::model::{FeedbackExample, display_value, risk_label};

const SIDEBAR_WIDTH: u16 = 24;

fn selected_style(is_selected: bool) -> Style {
    if is_selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    }
}

fn header_style() -> Style {
    Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD)
}

fn bordered(title: impl Into<String>) -> Block<'static> {
    Block::default().borders(Borders::ALL).title(title.into())
}

fn risk_color(score: u32) -> Color {
    match risk_label(score) {
        "Low Risk" => Color::Green,
        "Medium Risk" => Color::Yellow,
        _ => Color::Red,
    }
}

/// Draw the loading/error/empty state for a resource. Returns false when the
/// resource is loaded and the caller should draw it.
fn render_state<T>(frame: &mut Frame, area: Rect, title: &str, state: &Loadable<T>) -> bool {
    let text = match state {
        Loadable::Loaded(_) => return false,
        Loadable::Idle => Text::from(""),
        Loadable::Loading => Text::from("Loading..."),
        Loadable::Failed(message) => Text::from(vec![
            Line::from(Span::styled(
                format!("Error: {message}"),
                Style::default().fg(Color::Red),
            )),
            Line::from(""),
            Line::from("Press r to retry"),
        ]),
    };
    let paragraph = Paragraph::new(text)
        .block(bordered(title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
    true
}

impl App {
    pub(super) fn render(&self, frame: &mut Frame) {
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .split(frame.area());
        let content = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(columns[1]);

        self.render_sidebar(frame, columns[0]);
        match self.dashboard.route {
            Route::Overview => self.render_overview(frame, content[0]),
            Route::ReviewQueue => self.render_review(frame, content[0]),
            Route::Settings => self.render_settings(frame, content[0]),
            Route::TikTokHub | Route::InstagramHub | Route::XHub => {
                if let Some(platform) = self.dashboard.route.platform() {
                    self.render_hub(frame, content[0], self.dashboard.hub(platform));
                }
            }
            Route::Personas => self.render_personas(frame, content[0]),
            Route::CommentLibrary => self.render_library(frame, content[0]),
            Route::AiLearning => self.render_learning(frame, content[0]),
        }
        self.render_status_bar(frame, content[1]);

        if self.show_help {
            self.render_help(frame);
        }
        if self.confirm_action.is_some() {
            self.render_confirm(frame);
        }
        if self.input.is_some() {
            self.render_prompt(frame);
        }
    }

    fn render_sidebar(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = Route::ALL
            .iter()
            .enumerate()
            .map(|(idx, route)| {
                let mut spans = vec![Span::raw(format!("{} {}", idx + 1, route.label()))];
                if *route == Route::ReviewQueue
                    && let Some(count) = self.dashboard.sidebar.pending_count
                    && count > 0
                {
                    spans.push(Span::styled(
                        format!(" ({count})"),
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ));
                }
                ListItem::new(Line::from(spans))
                    .style(selected_style(*route == self.dashboard.route))
            })
            .collect();
        let list = List::new(items).block(bordered("Social Agent"));
        frame.render_widget(list, area);
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let text = match &self.status_message {
            Some((msg, _)) => msg.clone(),
            None => match self.current_screen().error() {
                Some(_) => "Request failed | r: retry  ?: help  q: quit".to_string(),
                None => format!(
                    "{} | Tab/1-9: screens  {}  r: refresh  ?: help  q: quit",
                    self.dashboard.route.label(),
                    screen_keys(self.dashboard.route, self.dashboard.settings.tab)
                ),
            },
        };
        let paragraph = Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_overview(&self, frame: &mut Frame, area: Rect) {
        let overview = &self.dashboard.overview;
        let title = format!("Overview ({}, t: change)", overview.timeframe.as_str());
        if render_state(frame, area, &title, &overview.data) {
            return;
        }
        let Some(data) = overview.data.loaded() else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(1)])
            .split(area);

        let kpis = Paragraph::new(vec![
            Line::from(format!(
                "Engagements: {}    Engagement rate: {:.1}%",
                data.total_engagements, data.avg_engagement_rate
            )),
            Line::from(format!(
                "Approval rate: {:.1}%    Active platforms: {}",
                data.approval_rate, data.active_platforms
            )),
        ])
        .block(bordered(title));
        frame.render_widget(kpis, chunks[0]);

        let rows: Vec<Row> = overview
            .summaries()
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                let trend_color = match s.trending_status.as_str() {
                    "green" => Color::Green,
                    "yellow" => Color::Yellow,
                    _ => Color::Red,
                };
                Row::new(vec![
                    Cell::from(s.platform.clone()),
                    Cell::from(s.comments_posted.to_string()),
                    Cell::from(format!("{:.1}", s.avg_likes)),
                    Cell::from(format!("{:.2}", s.sentiment_score)),
                    Cell::from(Span::styled(
                        s.trending_status.clone(),
                        Style::default().fg(trend_color),
                    )),
                ])
                .style(selected_style(idx == overview.selected))
            })
            .collect();
        let widths = [
            Constraint::Percentage(25),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
            Constraint::Percentage(20),
        ];
        let table = Table::new(rows, widths)
            .header(
                Row::new(vec!["Platform", "Comments", "Avg likes", "Sentiment", "Trend"])
                    .style(header_style()),
            )
            .block(bordered("Platforms (Enter: open hub)"));
        frame.render_widget(table, chunks[1]);
    }

    fn render_review(&self, frame: &mut Frame, area: Rect) {
        let review = &self.dashboard.review;
        if render_state(frame, area, "Review Queue", &review.queue) {
            return;
        }
        let Some(queue) = review.queue.loaded() else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let header = Paragraph::new(format!(
            "Pending: {}    Avg wait: {:.1} min    SLA breaches: {}",
            queue.pending(),
            queue.avg_wait_min,
            queue.sla_breaches
        ))
        .block(bordered("Review Queue"));
        frame.render_widget(header, chunks[0]);

        let Some(item) = review.current() else {
            let empty = Paragraph::new("Queue is empty. Nothing to review.")
                .block(bordered("Draft"));
            frame.render_widget(empty, chunks[1]);
            return;
        };

        let ctx = item.video_context.clone().unwrap_or_default();
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Author: ", header_style()),
                Span::raw(item.author().to_string()),
            ]),
            Line::from(vec![
                Span::styled("Post: ", header_style()),
                Span::raw(ctx.description.unwrap_or_default()),
            ]),
        ];
        if let Some(url) = ctx.video_url {
            lines.push(Line::from(vec![
                Span::styled("Link: ", header_style()),
                Span::raw(url),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Proposed reply:", header_style())));
        lines.push(Line::from(item.proposed_text.clone()));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                format!("{} ({})", item.risk_label(), item.risk_score),
                Style::default().fg(risk_color(item.risk_score)),
            ),
            Span::raw(
                item.classification
                    .as_deref()
                    .map(|c| format!("    {c}"))
                    .unwrap_or_default(),
            ),
        ]));
        if let Some(reasoning) = &item.risk_reasoning {
            lines.push(Line::from(reasoning.clone()));
        }

        let title = format!("Draft {} of {}", review.index + 1, queue.items.len());
        let paragraph = Paragraph::new(Text::from(lines))
            .block(bordered(title))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, chunks[1]);
    }

    fn render_settings(&self, frame: &mut Frame, area: Rect) {
        let settings = &self.dashboard.settings;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let titles: Vec<&str> = SettingsTab::ALL.iter().map(|t| t.label()).collect();
        let tabs = Tabs::new(titles)
            .block(bordered("Settings (h/l: tab)"))
            .select(settings.tab.index())
            .highlight_style(selected_style(true));
        frame.render_widget(tabs, chunks[0]);

        let body = chunks[1];
        match settings.tab {
            SettingsTab::Connections => self.render_connections(frame, body),
            SettingsTab::Voice => self.render_voice(frame, body),
            SettingsTab::Knowledge => self.render_knowledge(frame, body),
            SettingsTab::Execution => self.render_execution(frame, body),
        }
    }

    fn render_connections(&self, frame: &mut Frame, area: Rect) {
        let settings = &self.dashboard.settings;
        if render_state(frame, area, "Connections", &settings.connections) {
            return;
        }
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(4)])
            .split(area);

        let rows: Vec<Row> = Platform::ALL
            .iter()
            .enumerate()
            .map(|(idx, platform)| {
                let conn = settings.connection(*platform);
                let (status, color) = match conn {
                    Some(c) if c.connected => (c.status.clone(), Color::Green),
                    Some(c) => (c.status.clone(), Color::Red),
                    None => ("disconnected".to_string(), Color::Red),
                };
                Row::new(vec![
                    Cell::from(platform.display_name()),
                    Cell::from(Span::styled(status, Style::default().fg(color))),
                    Cell::from(conn.map(|c| c.token_status().to_string()).unwrap_or_default()),
                    Cell::from(
                        conn.and_then(|c| c.auth_method.clone())
                            .unwrap_or_else(|| "-".to_string()),
                    ),
                    Cell::from(conn.map(|c| c.worker_count()).unwrap_or(0).to_string()),
                ])
                .style(selected_style(idx == settings.platform_selected))
            })
            .collect();
        let widths = [
            Constraint::Percentage(25),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
        ];
        let table = Table::new(rows, widths)
            .header(Row::new(vec!["Platform", "Status", "Token", "Auth", "Workers"]).style(header_style()))
            .block(bordered("Connections (c: connect  d: disconnect  t: test  o: OAuth code)"));
        frame.render_widget(table, chunks[0]);

        let mut notes = Vec::new();
        if let Some(url) = &settings.pending_auth_url {
            notes.push(Line::from(format!("Authorize in a browser: {url}")));
        }
        if let Some(test) = &settings.last_test {
            notes.push(Line::from(format!(
                "Last test: {}{}",
                if test.healthy { "healthy" } else { "unhealthy" },
                test.details
                    .as_deref()
                    .map(|d| format!(" ({d})"))
                    .unwrap_or_default()
            )));
        }
        let paragraph = Paragraph::new(notes)
            .block(Block::default().borders(Borders::ALL))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, chunks[1]);
    }

    fn render_voice(&self, frame: &mut Frame, area: Rect) {
        let settings = &self.dashboard.settings;
        if render_state(frame, area, "Brand Voice", &settings.voice) {
            return;
        }
        let Some(voice) = settings.voice.loaded() else {
            return;
        };
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(area);

        let mut lines: Vec<Line> = voice
            .voice_guide_md
            .as_deref()
            .unwrap_or("No voice guide configured.")
            .lines()
            .map(|l| Line::from(l.to_string()))
            .collect();
        lines.push(Line::from(""));
        lines.push(Line::from(format!(
            "{} positive / {} negative examples, {} platform adapters",
            voice.positive_examples.len(),
            voice.negative_examples.len(),
            voice.platform_adapters.len()
        )));
        let guide = Paragraph::new(lines)
            .block(bordered("Voice guide"))
            .wrap(Wrap { trim: false });
        frame.render_widget(guide, chunks[0]);

        let items: Vec<ListItem> = match &settings.voice_test {
            None => vec![ListItem::new("Press v to test the voice against a post")],
            Some(candidates) if candidates.is_empty() => vec![ListItem::new("No candidates returned")],
            Some(candidates) => candidates
                .iter()
                .map(|c| {
                    ListItem::new(Text::from(vec![
                        Line::from(Span::styled(
                            format!("{} ({} chars)", c.approach, c.char_count),
                            header_style(),
                        )),
                        Line::from(c.text.clone()),
                    ]))
                })
                .collect(),
        };
        frame.render_widget(List::new(items).block(bordered("Voice test")), chunks[1]);
    }

    fn render_knowledge(&self, frame: &mut Frame, area: Rect) {
        let settings = &self.dashboard.settings;
        if render_state(frame, area, "Knowledge", &settings.files) {
            return;
        }
        let files = settings.files.loaded().map(Vec::as_slice).unwrap_or(&[]);
        let rows: Vec<Row> = files
            .iter()
            .enumerate()
            .map(|(idx, f)| {
                Row::new(vec![
                    Cell::from(f.filename.clone()),
                    Cell::from(format!("{} B", f.size)),
                    Cell::from(f.uploaded_at.clone().unwrap_or_default()),
                ])
                .style(selected_style(idx == settings.file_selected))
            })
            .collect();
        let widths = [
            Constraint::Percentage(50),
            Constraint::Percentage(15),
            Constraint::Percentage(35),
        ];
        let table = Table::new(rows, widths)
            .header(Row::new(vec!["File", "Size", "Uploaded"]).style(header_style()))
            .block(bordered(format!("Knowledge documents: {} (u: upload)", files.len())));
        frame.render_widget(table, area);
    }

    fn render_execution(&self, frame: &mut Frame, area: Rect) {
        let settings = &self.dashboard.settings;
        if render_state(frame, area, "Execution", &settings.execution) {
            return;
        }
        let Some(execution) = settings.execution.loaded() else {
            return;
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(1)])
            .split(area);

        let kill = &execution.kill_switch;
        let (label, color) = if kill.active {
            ("ACTIVE: all automated posting is halted", Color::Red)
        } else {
            ("inactive: posting enabled", Color::Green)
        };
        let mut lines = vec![Line::from(Span::styled(
            format!("Kill switch {label}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ))];
        if let Some(reason) = &kill.reason {
            lines.push(Line::from(format!("Reason: {reason}")));
        }
        if let Some(at) = &kill.activated_at {
            lines.push(Line::from(format!("Since: {at}")));
        }
        let paragraph = Paragraph::new(lines).block(bordered("Kill switch (K: toggle)"));
        frame.render_widget(paragraph, chunks[0]);

        let rows: Vec<Row> = execution
            .platforms
            .iter()
            .map(|(name, p)| {
                Row::new(vec![
                    Cell::from(name.clone()),
                    Cell::from(p.status.clone()),
                    Cell::from(
                        p.workers
                            .iter()
                            .map(|(w, state)| format!("{w}: {}", display_value(state)))
                            .collect::<Vec<_>>()
                            .join(", "),
                    ),
                ])
            })
            .collect();
        let widths = [
            Constraint::Percentage(20),
            Constraint::Percentage(20),
            Constraint::Percentage(60),
        ];
        let table = Table::new(rows, widths)
            .header(Row::new(vec!["Platform", "Status", "Workers"]).style(header_style()))
            .block(bordered("Workers"));
        frame.render_widget(table, chunks[1]);
    }

    fn render_hub(&self, frame: &mut Frame, area: Rect, hub: &HubScreen) {
        let title = hub.platform.display_name();
        if render_state(frame, area, title, &hub.stats) {
            return;
        }
        let Some(stats) = hub.stats.loaded() else {
            return;
        };

        let mut constraints = vec![Constraint::Length(3), Constraint::Min(6)];
        if hub.has_review_posts() {
            constraints.push(Constraint::Percentage(45));
        }
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let kpis = stats
            .stats
            .iter()
            .map(|(k, v)| format!("{k}: {}", display_value(v)))
            .collect::<Vec<_>>()
            .join("    ");
        frame.render_widget(Paragraph::new(kpis).block(bordered(title)), rows[0]);

        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(rows[1]);

        let discovered: Vec<ListItem> = if !stats.keywords.is_empty() {
            stats
                .keywords
                .iter()
                .map(|k| {
                    ListItem::new(format!(
                        "{}  [{}] {}  vol {}",
                        k.term,
                        k.action,
                        k.matched,
                        display_value(&k.volume)
                    ))
                })
                .collect()
        } else if !stats.reels.is_empty() {
            stats
                .reels
                .iter()
                .map(|r| {
                    ListItem::new(format!(
                        "@{}  {}  ♥ {}",
                        r.creator,
                        r.description,
                        display_value(&r.likes)
                    ))
                })
                .collect()
        } else {
            stats
                .feed
                .iter()
                .map(|f| ListItem::new(format!("{} [{}] {}", f.user, f.label, f.post)))
                .collect()
        };
        frame.render_widget(List::new(discovered).block(bordered("Discovered")), middle[0]);

        let drafts_focused = hub.focus == HubFocus::Drafts;
        let draft_rows: Vec<Row> = hub
            .drafts()
            .iter()
            .enumerate()
            .map(|(idx, d)| {
                Row::new(vec![
                    Cell::from(d.user.clone()),
                    Cell::from(d.msg.clone()),
                    Cell::from(d.draft.clone()),
                    Cell::from(Span::styled(
                        d.risk_score.to_string(),
                        Style::default().fg(risk_color(d.risk_score)),
                    )),
                ])
                .style(selected_style(drafts_focused && idx == hub.draft_selected))
            })
            .collect();
        let widths = [
            Constraint::Percentage(18),
            Constraint::Percentage(32),
            Constraint::Percentage(40),
            Constraint::Percentage(10),
        ];
        let drafts = Table::new(draft_rows, widths)
            .header(Row::new(vec!["User", "Message", "Draft", "Risk"]).style(header_style()))
            .block(bordered(format!(
                "Pending drafts: {} (a: approve  x: reject)",
                hub.drafts().len()
            )));
        frame.render_widget(drafts, middle[1]);

        if hub.has_review_posts() {
            self.render_review_posts(frame, rows[2], hub);
        }
    }

    fn render_review_posts(&self, frame: &mut Frame, area: Rect, hub: &HubScreen) {
        let title = format!(
            "Review posts [{}] (f: focus  F: filter  e: draft  a: approve  D: remove)",
            hub.post_filter.as_str()
        );
        if render_state(frame, area, &title, &hub.posts) {
            return;
        }
        let posts_focused = hub.focus == HubFocus::Posts;
        let rows: Vec<Row> = hub
            .review_posts()
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let risk = match p.risk_level.as_str() {
                    "green" => Color::Green,
                    "yellow" => Color::Yellow,
                    _ => Color::Red,
                };
                Row::new(vec![
                    Cell::from(format!("@{}", p.author)),
                    Cell::from(p.text.clone()),
                    Cell::from(format!("{}/{}/{}", p.likes, p.retweets, p.replies)),
                    Cell::from(format!("{:.1}", p.recommendation_score)),
                    Cell::from(Span::styled(p.status.as_str(), Style::default().fg(risk))),
                    Cell::from(p.draft_comment.clone().unwrap_or_default()),
                ])
                .style(selected_style(posts_focused && idx == hub.post_selected))
            })
            .collect();
        let widths = [
            Constraint::Percentage(14),
            Constraint::Percentage(34),
            Constraint::Percentage(12),
            Constraint::Percentage(8),
            Constraint::Percentage(10),
            Constraint::Percentage(22),
        ];
        let table = Table::new(rows, widths)
            .header(
                Row::new(vec!["Author", "Post", "L/RT/R", "Score", "Status", "Draft"])
                    .style(header_style()),
            )
            .block(bordered(title));
        frame.render_widget(table, area);
    }

    fn render_personas(&self, frame: &mut Frame, area: Rect) {
        let personas = &self.dashboard.personas;
        if render_state(frame, area, "AI Personality", &personas.personas) {
            return;
        }
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
            .split(area);

        let items: Vec<ListItem> = personas
            .list()
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                let marker = if p.active { "●" } else { "○" };
                let unsaved = if personas.is_unsaved(idx) { " *" } else { "" };
                ListItem::new(format!("{marker} {}{unsaved}", p.name))
                    .style(selected_style(idx == personas.selected))
            })
            .collect();
        frame.render_widget(
            List::new(items).block(bordered("Personas (g: generate)")),
            chunks[0],
        );

        let Some(persona) = personas.current() else {
            let empty = Paragraph::new("No personas yet. Press g to generate one from a document.")
                .block(bordered("Persona"));
            frame.render_widget(empty, chunks[1]);
            return;
        };
        let detail = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(chunks[1]);

        let mut lines = vec![
            Line::from(vec![
                Span::styled("Type: ", header_style()),
                Span::raw(persona.kind.clone()),
                Span::raw(if persona.active { "   (active)" } else { "" }),
            ]),
            Line::from(""),
            Line::from(Span::styled("Core identity", header_style())),
            Line::from(persona.core_identity.clone()),
            Line::from(""),
            Line::from(Span::styled("Tone modifiers", header_style())),
            Line::from(persona.tone_modifiers.clone()),
            Line::from(""),
            Line::from(Span::styled("Rules", header_style())),
        ];
        lines.extend(persona.rules.iter().map(|r| Line::from(format!("- {r}"))));
        let body = Paragraph::new(lines)
            .block(bordered(format!(
                "{} (space: active  s: save)",
                persona.name
            )))
            .wrap(Wrap { trim: false });
        frame.render_widget(body, detail[0]);

        let percent = (persona.temperature * 100.0).round().clamp(0.0, 100.0) as u16;
        let gauge = Gauge::default()
            .block(bordered("Temperature (-/+)"))
            .gauge_style(Style::default().fg(Color::Magenta))
            .percent(percent)
            .label(format!("{:.1}", persona.temperature));
        frame.render_widget(gauge, detail[1]);
    }

    fn render_library(&self, frame: &mut Frame, area: Rect) {
        let library = &self.dashboard.library;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let cursor = if self.searching { "_" } else { "" };
        let search = Paragraph::new(format!(
            "Search: {}{cursor}    Category: {}",
            library.search_input,
            library.filter.category.as_deref().unwrap_or("All")
        ))
        .block(bordered("Comment Library (/: search  c: category  n/p: page)"));
        frame.render_widget(search, chunks[0]);

        if render_state(frame, chunks[1], "Snippets", &library.page) {
            return;
        }
        let Some(page) = library.page.loaded() else {
            return;
        };
        let rows: Vec<Row> = page
            .items
            .iter()
            .enumerate()
            .map(|(idx, s)| {
                Row::new(vec![
                    Cell::from(s.text.clone()),
                    Cell::from(s.category.clone()),
                    Cell::from(s.tags.join(", ")),
                    Cell::from(s.uses.to_string()),
                    Cell::from(format!("{:.1}", s.avg_likes)),
                ])
                .style(selected_style(idx == library.selected))
            })
            .collect();
        let widths = [
            Constraint::Percentage(45),
            Constraint::Percentage(15),
            Constraint::Percentage(20),
            Constraint::Percentage(8),
            Constraint::Percentage(12),
        ];
        let table = Table::new(rows, widths)
            .header(Row::new(vec!["Snippet", "Category", "Tags", "Uses", "Avg likes"]).style(header_style()))
            .block(bordered(format!(
                "{} snippets, page {} of {}",
                page.total,
                library.filter.page,
                page.page_count()
            )));
        frame.render_widget(table, chunks[1]);
    }

    fn render_learning(&self, frame: &mut Frame, area: Rect) {
        let learning = &self.dashboard.learning;
        if render_state(frame, area, "AI Learning", &learning.stats) {
            return;
        }
        let Some(stats) = learning.stats.loaded() else {
            return;
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Length(7),
                Constraint::Min(1),
            ])
            .split(area);

        let summary = Paragraph::new(vec![
            Line::from(format!(
                "Decisions: {}    Approved: {}    Denied: {}",
                stats.total_decisions, stats.approved_count, stats.denied_count
            )),
            Line::from(format!(
                "Approval rate: {:.0}%    Recent: {:.0}%    Improvement: {:+.1}",
                stats.approval_rate, stats.recent_approval_rate, stats.improvement
            )),
            Line::from(format!(
                "Active examples: {} approved / {} denied",
                stats.active_approved_examples, stats.active_denied_examples
            )),
        ])
        .block(bordered("AI Learning"));
        frame.render_widget(summary, chunks[0]);

        if !render_state(frame, chunks[1], "Approval trend", &learning.trend) {
            let data = learning.trend_percentages();
            let sparkline = Sparkline::default()
                .block(bordered(format!("Approval trend ({} days)", data.len())))
                .data(&data)
                .max(100)
                .style(Style::default().fg(Color::Green));
            frame.render_widget(sparkline, chunks[1]);
        }

        if render_state(frame, chunks[2], "Examples", &learning.examples) {
            return;
        }
        let Some(examples) = learning.examples.loaded() else {
            return;
        };
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);
        let to_items = |list: &[FeedbackExample]| -> Vec<ListItem<'static>> {
            list.iter()
                .map(|ex| {
                    let mut text = vec![Line::from(ex.comment_text.clone())];
                    if let Some(reason) = &ex.decision_reason {
                        text.push(Line::from(Span::styled(
                            format!("  reason: {reason}"),
                            Style::default().fg(Color::DarkGray),
                        )));
                    }
                    ListItem::new(Text::from(text))
                })
                .collect()
        };
        frame.render_widget(
            List::new(to_items(&examples.approved)).block(bordered("Approved examples")),
            columns[0],
        );
        frame.render_widget(
            List::new(to_items(&examples.denied)).block(bordered("Denied examples")),
            columns[1],
        );
    }

    fn render_help(&self, frame: &mut Frame) {
        let help_text = [
            "Social Agent - Keyboard Shortcuts",
            "",
            "Screens:",
            "  Tab / Shift+Tab  - Next / previous screen",
            "  1-9              - Jump to screen",
            "  r                - Refresh (retry after an error)",
            "",
            "Lists:",
            "  j / k            - Move down / up",
            "",
            "Review queue:",
            "  a / x / e        - Approve / reject / edit and approve",
            "  g                - Regenerate draft",
            "",
            "Hubs:",
            "  a / x            - Approve / reject pending draft",
            "  f / F            - Switch list / cycle post filter (X)",
            "",
            "Settings:",
            "  h / l            - Switch tab",
            "  K                - Toggle kill switch (Execution)",
            "",
            "Other:",
            "  ?                - Show this help",
            "  q / Esc          - Quit",
            "",
            "Press any key to close this help",
        ];
        let text = Text::from(help_text.iter().map(|&s| Line::from(s)).collect::<Vec<_>>());
        let paragraph = Paragraph::new(text)
            .block(bordered("Help"))
            .wrap(Wrap { trim: false });
        let area = centered_rect(60, 80, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }

    fn render_confirm(&self, frame: &mut Frame) {
        let message = match &self.confirm_action {
            Some(ConfirmAction::KillSwitch { active: true }) => {
                "Activate the kill switch? All automated posting stops.".to_string()
            }
            Some(ConfirmAction::KillSwitch { active: false }) => {
                "Deactivate the kill switch and resume posting?".to_string()
            }
            Some(ConfirmAction::Disconnect(platform)) => {
                format!("Disconnect {}?", platform.display_name())
            }
            Some(ConfirmAction::RemovePost) => "Remove the selected review post?".to_string(),
            None => return,
        };
        let paragraph = Paragraph::new(format!("{message}\n\n(y)es / (n)o"))
            .block(bordered("Confirm"))
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(Color::Yellow));
        let area = centered_rect(50, 30, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }

    fn render_prompt(&self, frame: &mut Frame) {
        let Some(prompt) = &self.input else {
            return;
        };
        let paragraph = Paragraph::new(format!("{}_\n\nEnter: submit  Esc: cancel", prompt.buffer))
            .block(bordered(prompt.purpose.title()))
            .wrap(Wrap { trim: false });
        let area = centered_rect(60, 30, frame.area());
        frame.render_widget(Clear, area);
        frame.render_widget(paragraph, area);
    }
}

fn screen_keys(route: Route, tab: SettingsTab) -> &'static str {
    match route {
        Route::Overview => "j/k: select  t: timeframe  Enter: open hub",
        Route::ReviewQueue => "j/k: step  a: approve  x: reject  e: edit  g: regenerate",
        Route::Settings => match tab {
            SettingsTab::Connections => "h/l: tab  c: connect  d: disconnect  t: test  o: OAuth code",
            SettingsTab::Voice => "h/l: tab  v: voice test",
            SettingsTab::Knowledge => "h/l: tab  u: upload",
            SettingsTab::Execution => "h/l: tab  K: kill switch",
        },
        Route::TikTokHub | Route::InstagramHub | Route::XHub => "j/k: select  a: approve  x: reject",
        Route::Personas => "j/k: select  -/+: temperature  space: active  s: save  g: generate",
        Route::CommentLibrary => "/: search  c: category  n/p: page",
        Route::AiLearning => "",
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Timeframe;
    use crate::api::ApiClient;
    use crate::config::{ApiSettings, DashboardSettings};
    use crate::dashboard::Dashboard;
    use crate::model::{ReviewItem, ReviewQueue};
    use crate::state::LocalStore;
    use ratatui::{Terminal, backend::TestBackend};

    fn app_on(route: Route) -> App {
        let api = ApiClient::new(&ApiSettings::default(), None);
        let dashboard = Dashboard::new(&DashboardSettings::default(), Timeframe::Day);
        App::new(api, LocalStore::in_memory().unwrap(), dashboard, Some(route))
    }

    fn draw(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(50, 30, outer);
        assert!(inner.x >= outer.x && inner.right() <= outer.right());
        assert!(inner.y >= outer.y && inner.bottom() <= outer.bottom());
    }

    #[test]
    fn loading_screen_says_so() {
        let app = app_on(Route::Personas);
        assert!(draw(&app).contains("Loading..."));
    }

    #[test]
    fn failed_screen_offers_retry() {
        let mut app = app_on(Route::ReviewQueue);
        app.dashboard.review.queue = Loadable::Failed("API error 503: maintenance".to_string());
        let screen = draw(&app);
        assert!(screen.contains("Error: API error 503: maintenance"));
        assert!(screen.contains("Press r to retry"));
    }

    #[test]
    fn review_draft_and_badge_render() {
        let mut app = app_on(Route::ReviewQueue);
        app.dashboard.sidebar.pending_count = Some(2);
        app.dashboard.review.queue = Loadable::Loaded(ReviewQueue {
            items: vec![
                ReviewItem {
                    id: "1".to_string(),
                    proposed_text: "Budgeting tip: pay yourself first".to_string(),
                    risk_score: 12,
                    ..Default::default()
                },
                ReviewItem {
                    id: "2".to_string(),
                    ..Default::default()
                },
            ],
            pending_count: Some(2),
            ..Default::default()
        });
        let screen = draw(&app);
        assert!(screen.contains("Review Queue (2)"));
        assert!(screen.contains("Draft 1 of 2"));
        assert!(screen.contains("Budgeting tip: pay yourself first"));
        assert!(screen.contains("Low Risk (12)"));
    }
}
