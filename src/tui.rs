use crate::add_investment::{AddInvestmentView, Focus, SUCCESS_MESSAGE};
use crate::fixtures;
use crate::format::{format_currency, format_number, format_percent, format_shares};
use crate::instrument::AssetTab;
use crate::learning::{LearningCenter, LearningTab};
use crate::order::{Clock, FormField, SystemClock};
use crate::portfolio::PortfolioView;
use crate::stock_detail::{
    DetailTab, LoadState, Sentiment, StockDetail, StockDetailView, TimeRange,
};
use crate::store::{KeyValueStore, OrderBook};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Block, Borders, Cell, Chart, Clear, Dataset, GraphType, List, ListItem, Paragraph,
        Row, Table, Tabs, Wrap,
    },
    Frame, Terminal,
};
use std::io;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};
use tui_big_text::{BigText, PixelSize};

/// Named destinations of the in-app navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Learning,
    AddInvestment,
    StockDetail(String),
}

impl View {
    fn nav_index(&self) -> usize {
        match self {
            View::Learning => 1,
            _ => 0,
        }
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dashboard" | "portfolio" => Ok(View::Dashboard),
            "learning" => Ok(View::Learning),
            "add" | "add-investment" => Ok(View::AddInvestment),
            other => match other.strip_prefix("stock:") {
                Some(symbol) if !symbol.is_empty() => Ok(View::StockDetail(symbol.to_uppercase())),
                _ => Err(format!("Unknown view: '{s}'")),
            },
        }
    }
}

/// The view-model of whatever screen is showing. Replacing it tears the old
/// screen down, which stops its timers.
pub enum Screen {
    Dashboard(PortfolioView),
    Learning(LearningCenter),
    StockDetail(StockDetailView),
    AddInvestment(AddInvestmentView),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NotificationKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub jitter_interval: Duration,
    pub load_delay: Duration,
}

pub struct App {
    pub view: View,
    pub screen: Screen,
    pub should_quit: bool,
    pub currency: String,
    pub notification: Option<Notification>,
    book: OrderBook<Box<dyn KeyValueStore>>,
    clock: Box<dyn Clock>,
    timing: Timing,
}

impl App {
    pub fn new(currency: String, book: OrderBook<Box<dyn KeyValueStore>>, timing: Timing) -> App {
        let mut app = App {
            view: View::Dashboard,
            screen: Screen::Learning(LearningCenter::new()),
            should_quit: false,
            currency,
            notification: None,
            book,
            clock: Box::new(SystemClock),
            timing,
        };
        app.navigate(View::Dashboard);
        app
    }

    /// Replaces the clock used for order ids and default order dates.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> App {
        self.clock = Box::new(clock);
        self
    }

    /// Releases the active screen's timers before it is replaced.
    fn leave(&mut self) {
        match &mut self.screen {
            Screen::Dashboard(portfolio) => portfolio.stop(),
            Screen::StockDetail(detail) => detail.deactivate(),
            Screen::Learning(_) | Screen::AddInvestment(_) => {}
        }
    }

    pub fn navigate(&mut self, view: View) {
        debug!(?view, "navigate");
        self.leave();
        self.screen = match &view {
            View::Dashboard => {
                let mut portfolio = PortfolioView::new().with_interval(self.timing.jitter_interval);
                portfolio.start();
                Screen::Dashboard(portfolio)
            }
            View::Learning => Screen::Learning(LearningCenter::new()),
            View::AddInvestment => {
                Screen::AddInvestment(AddInvestmentView::new(self.clock.as_ref()))
            }
            View::StockDetail(symbol) => {
                let mut detail = StockDetailView::new().with_delay(self.timing.load_delay);
                detail.activate(symbol);
                Screen::StockDetail(detail)
            }
        };
        self.view = view;
    }

    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.notification = Some(Notification {
            kind,
            message: message.into(),
        });
    }

    /// Lets the active screen pick up timer results. Returns true if
    /// anything changed.
    pub fn tick(&mut self) -> bool {
        match &mut self.screen {
            Screen::Dashboard(portfolio) => portfolio.poll_ticks() > 0,
            Screen::StockDetail(detail) if detail.is_loading() => detail.poll_load(),
            _ => false,
        }
    }

    pub fn submit_order(&mut self) {
        let Screen::AddInvestment(add) = &self.screen else {
            return;
        };
        match add.submit(&self.book, self.clock.as_ref()) {
            Ok(_) => {
                self.navigate(View::Dashboard);
                self.notify(NotificationKind::Info, SUCCESS_MESSAGE);
            }
            Err(e) => {
                warn!("Order rejected: {e}");
                self.notify(NotificationKind::Error, e.to_string());
            }
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        // Any key dismisses an open popup
        if self.notification.take().is_some() {
            return;
        }
        match self.screen {
            Screen::Dashboard(_) => self.handle_dashboard_key(code),
            Screen::Learning(_) => self.handle_learning_key(code),
            Screen::StockDetail(_) => self.handle_detail_key(code),
            Screen::AddInvestment(_) => self.handle_add_key(code),
        }
    }

    fn handle_global_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.navigate(View::Dashboard),
            KeyCode::Char('2') => self.navigate(View::Learning),
            KeyCode::Char('a') => self.navigate(View::AddInvestment),
            _ => return false,
        }
        true
    }

    fn handle_dashboard_key(&mut self, code: KeyCode) {
        let Screen::Dashboard(portfolio) = &mut self.screen else {
            return;
        };
        match code {
            KeyCode::Char('j') | KeyCode::Down => portfolio.select_next(),
            KeyCode::Char('k') | KeyCode::Up => portfolio.select_previous(),
            KeyCode::Enter => {
                if let Some(symbol) = portfolio.selected().map(|h| h.symbol().to_string()) {
                    self.navigate(View::StockDetail(symbol));
                }
            }
            KeyCode::Esc => self.should_quit = true,
            other => {
                self.handle_global_key(other);
            }
        }
    }

    fn handle_learning_key(&mut self, code: KeyCode) {
        let Screen::Learning(center) = &mut self.screen else {
            return;
        };
        match code {
            KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => center.set_tab(center.tab.next()),
            KeyCode::Char('j') | KeyCode::Down => center.cursor_down(),
            KeyCode::Char('k') | KeyCode::Up => center.cursor_up(),
            KeyCode::Enter => center.activate_cursor(),
            KeyCode::Char('b') | KeyCode::Backspace => center.back_to_courses(),
            KeyCode::Char('c') => {
                if let Some(message) = center.complete_course() {
                    self.notify(NotificationKind::Info, message);
                }
            }
            KeyCode::Esc => self.navigate(View::Dashboard),
            other => {
                self.handle_global_key(other);
            }
        }
    }

    fn handle_detail_key(&mut self, code: KeyCode) {
        let Screen::StockDetail(detail) = &mut self.screen else {
            return;
        };
        match code {
            KeyCode::Tab => detail.set_tab(detail.tab.next()),
            KeyCode::Char('l') | KeyCode::Right => detail.set_time_range(detail.time_range.next()),
            KeyCode::Char('h') | KeyCode::Left => {
                detail.set_time_range(detail.time_range.previous())
            }
            KeyCode::Char('w') => {
                let message = if detail.toggle_watchlist() {
                    "Added to watchlist"
                } else {
                    "Removed from watchlist"
                };
                self.notify(NotificationKind::Info, message);
            }
            KeyCode::Char('b') => {
                let message = detail.buy_notice();
                self.notify(NotificationKind::Info, message);
            }
            KeyCode::Esc => self.navigate(View::Dashboard),
            other => {
                self.handle_global_key(other);
            }
        }
    }

    fn handle_add_key(&mut self, code: KeyCode) {
        let Screen::AddInvestment(add) = &mut self.screen else {
            return;
        };
        let focus = add.focus;
        match code {
            KeyCode::Esc => self.navigate(View::Dashboard),
            KeyCode::Tab => add.next_focus(),
            KeyCode::Backspace => add.backspace(),
            KeyCode::Down => add.cursor_down(),
            KeyCode::Up => add.cursor_up(),
            KeyCode::Left | KeyCode::Right if focus != Focus::Form(FormField::TransactionType) => {
                add.next_tab()
            }
            KeyCode::Left | KeyCode::Right => add.type_char(' '),
            KeyCode::Enter => match focus {
                Focus::Search | Focus::Assets => add.select_at_cursor(),
                Focus::Form(_) => self.submit_order(),
            },
            KeyCode::Char(c) => match focus {
                Focus::Assets => match c {
                    'j' => add.cursor_down(),
                    'k' => add.cursor_up(),
                    'l' | 'h' => add.next_tab(),
                    other => {
                        self.handle_global_key(KeyCode::Char(other));
                    }
                },
                _ => add.type_char(c),
            },
            _ => {}
        }
    }
}

pub async fn run_tui(
    currency: String,
    book: OrderBook<Box<dyn KeyValueStore>>,
    timing: Timing,
    view: Option<View>,
) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(currency, book, timing);
    if let Some(view) = view {
        app.navigate(view);
    }

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        // Pick up timer results (non-blocking)
        app.tick();

        // Yield so the timer tasks get to run between key polls
        tokio::time::sleep(Duration::from_millis(10)).await;

        if crossterm::event::poll(Duration::from_millis(90))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let nav_titles: Vec<Line> = ["Dashboard", "Learning Center"]
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let style = if i == app.view.nav_index() {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            Line::from(Span::styled(*t, style))
        })
        .collect();
    let nav = Tabs::new(nav_titles)
        .block(Block::default().borders(Borders::ALL).title("InvestVision"))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(Color::Yellow))
        .select(app.view.nav_index());
    f.render_widget(nav, chunks[0]);

    let help = match &app.screen {
        Screen::Dashboard(_) => {
            render_dashboard(f, chunks[1], app);
            "j/k select | Enter details | a add investment | 2 learning | q quit"
        }
        Screen::Learning(center) => {
            render_learning(f, chunks[1], center);
            "Tab/l next tab | j/k move | Enter open | b back | c complete | Esc dashboard"
        }
        Screen::StockDetail(detail) => {
            render_stock_detail(f, chunks[1], detail, &app.currency);
            "Tab section | h/l time range | w watchlist | b buy | Esc dashboard"
        }
        Screen::AddInvestment(add) => {
            render_add_investment(f, chunks[1], add, &app.currency);
            "Tab focus | ←/→ asset type | ↑/↓ move | Enter select/submit | Esc back"
        }
    };
    let help_line = Paragraph::new(help).style(Style::default().fg(Color::Gray));
    f.render_widget(help_line, chunks[2]);

    if let Some(notification) = &app.notification {
        render_notification(f, notification);
    }
}

fn change_color(value: f64) -> Color {
    if value >= 0.0 {
        Color::Green
    } else {
        Color::Red
    }
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let Screen::Dashboard(portfolio) = &app.screen else {
        return;
    };
    let currency = app.currency.as_str();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(area);
    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[0]);

    // Portfolio value card
    let summary = portfolio.summary;
    let value_text = format_currency(summary.total_value, currency);
    let card = Block::default()
        .borders(Borders::ALL)
        .title(format!(
            "Portfolio Value  {} ({}){}",
            format_currency(summary.daily_change, currency),
            format_percent(summary.daily_change_percent),
            if portfolio.is_running() { "  ● live" } else { "" }
        ))
        .title_alignment(Alignment::Center)
        .border_style(Style::default().fg(change_color(summary.daily_change)));
    let inner = card.inner(top[0]);
    f.render_widget(card, top[0]);
    let big_text = BigText::builder()
        .pixel_size(PixelSize::Quadrant)
        .style(
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )
        .lines(vec![value_text.into()])
        .build();
    f.render_widget(big_text, inner);

    // Summary stats
    let best = portfolio
        .best_performer()
        .map(|h| format!("{} {}", h.symbol(), format_percent(h.change_percent())))
        .unwrap_or_else(|| "-".to_string());
    let stats = vec![
        Line::from(vec![
            Span::raw("Today's Gain:      "),
            Span::styled(
                format_currency(summary.daily_change, currency),
                Style::default().fg(change_color(summary.daily_change)),
            ),
        ]),
        Line::from(format!("Total Investments: {}", portfolio.holdings_count())),
        Line::from(vec![
            Span::raw("Best Performer:    "),
            Span::styled(best, Style::default().fg(Color::Green)),
        ]),
    ];
    let stats_widget =
        Paragraph::new(stats).block(Block::default().borders(Borders::ALL).title("Summary"));
    f.render_widget(stats_widget, top[1]);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(rows[1]);

    // Holdings table
    let header_cells = ["Stock", "Price", "Change", "Shares", "Value"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    let header = Row::new(header_cells).height(1).bottom_margin(1);
    let table_rows = portfolio.holdings.iter().enumerate().map(|(i, holding)| {
        let row_style = if i == portfolio.selected_holding {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(format!("{} ({})", holding.name(), holding.symbol())),
            Cell::from(format_currency(holding.price(), currency)),
            Cell::from(format!(
                "{} ({})",
                format_currency(holding.change(), currency),
                format_percent(holding.change_percent())
            ))
            .style(Style::default().fg(change_color(holding.change()))),
            Cell::from(format_shares(holding.shares)),
            Cell::from(format_currency(holding.value(), currency)),
        ])
        .style(row_style)
    });
    let table = Table::new(
        table_rows,
        [
            Constraint::Percentage(28),
            Constraint::Percentage(17),
            Constraint::Percentage(27),
            Constraint::Percentage(10),
            Constraint::Percentage(18),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title("Your Holdings"));
    f.render_widget(table, bottom[0]);

    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(bottom[1]);

    let watchlist: Vec<ListItem> = portfolio
        .watchlist
        .iter()
        .map(|item| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<6}", item.symbol),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!("{} ", format_currency(item.price, currency))),
                Span::styled(
                    format_currency(item.change, currency),
                    Style::default().fg(change_color(item.change)),
                ),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(watchlist).block(Block::default().borders(Borders::ALL).title("Watchlist")),
        sidebar[0],
    );

    let news: Vec<ListItem> = portfolio
        .news
        .iter()
        .map(|n| {
            ListItem::new(vec![
                Line::from(n.title.as_str()),
                Line::from(Span::styled(
                    format!("{} · {}", n.source, n.time),
                    Style::default().fg(Color::Gray),
                )),
            ])
        })
        .collect();
    f.render_widget(
        List::new(news).block(Block::default().borders(Borders::ALL).title("Market News")),
        sidebar[1],
    );
}

fn render_learning(f: &mut Frame, area: Rect, center: &LearningCenter) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let titles: Vec<Line> = LearningTab::all().iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Investment Learning Center"),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .select(
            LearningTab::all()
                .iter()
                .position(|&t| t == center.tab)
                .unwrap_or(0),
        );
    f.render_widget(tabs, chunks[0]);

    let cursor_style = |i: usize| {
        if i == center.cursor {
            Style::default().bg(Color::DarkGray)
        } else {
            Style::default()
        }
    };

    let mut lines: Vec<Line> = Vec::new();
    match center.tab {
        LearningTab::Terms => {
            for (i, term) in fixtures::financial_terms().iter().enumerate() {
                let expanded = center.expanded_term() == Some(term.id);
                let marker = if expanded { "−" } else { "+" };
                lines.push(Line::styled(
                    format!("{marker} {}", term.term),
                    cursor_style(i).add_modifier(Modifier::BOLD),
                ));
                if expanded {
                    lines.push(Line::from(format!("    {}", term.definition)));
                    lines.push(Line::styled(
                        format!("    Example: {}", term.example),
                        Style::default().fg(Color::Cyan),
                    ));
                }
            }
        }
        LearningTab::Tutorials => {
            for (i, tutorial) in fixtures::dashboard_tutorials().iter().enumerate() {
                lines.push(Line::styled(
                    tutorial.title,
                    cursor_style(i).add_modifier(Modifier::BOLD),
                ));
                lines.push(Line::styled(
                    tutorial.description,
                    Style::default().fg(Color::Gray),
                ));
                for step in tutorial.steps {
                    lines.push(Line::from(format!("  • {step}")));
                }
                lines.push(Line::from(""));
            }
            lines.push(Line::styled(
                "Quick Tips",
                Style::default().add_modifier(Modifier::BOLD),
            ));
            for tip in fixtures::quick_tips() {
                lines.push(Line::from(format!("  💡 {tip}")));
            }
        }
        LearningTab::Courses => match center.selected_course() {
            Some(course) => {
                lines.push(Line::styled(
                    course.title,
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ));
                lines.push(Line::from(format!(
                    "{} · {} · {} lessons",
                    course.level, course.duration, course.lessons
                )));
                lines.push(Line::from(course.description));
                lines.push(Line::from(""));
                lines.push(Line::from("What You'll Learn:"));
                for topic in course.topics {
                    lines.push(Line::from(format!("  • {topic}")));
                }
                lines.push(Line::from(""));
                lines.push(Line::from("0% Complete  (c: mark as completed, b: back to courses)"));
            }
            None => {
                for (i, course) in fixtures::courses().iter().enumerate() {
                    lines.push(Line::styled(
                        format!("{} [{}] {}", course.title, course.level, course.duration),
                        cursor_style(i).add_modifier(Modifier::BOLD),
                    ));
                    lines.push(Line::styled(
                        format!("  {} ({} lessons)", course.description, course.lessons),
                        Style::default().fg(Color::Gray),
                    ));
                }
            }
        },
    }

    let content = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    f.render_widget(content, chunks[1]);
}

fn render_stock_detail(f: &mut Frame, area: Rect, view: &StockDetailView, currency: &str) {
    let detail = match view.state() {
        LoadState::Loaded(detail) => detail,
        LoadState::Missing => {
            render_message(f, area, "Not Found", &format!("No data for {}", view.symbol), Color::Red);
            return;
        }
        LoadState::Loading(_) | LoadState::Idle => {
            render_message(f, area, "Loading", "Loading...", Color::Yellow);
            return;
        }
    };
    let stock = &detail.profile;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Percentage(45),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(area);

    let watch_marker = if view.in_watchlist { "★ In Watchlist" } else { "☆ Add to Watchlist" };
    let header = vec![
        Line::from(vec![
            Span::styled(
                format!("{} ", stock.name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(stock.symbol.as_str(), Style::default().fg(Color::Gray)),
            Span::raw(format!("   {watch_marker}")),
        ]),
        Line::from(vec![
            Span::raw(format!("{}  ", format_currency(stock.current_price, currency))),
            Span::styled(
                format!(
                    "{} ({})",
                    format_currency(stock.change, currency),
                    format_percent(stock.change_percent)
                ),
                Style::default().fg(change_color(stock.change)),
            ),
        ]),
    ];
    f.render_widget(
        Paragraph::new(header).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    render_price_chart(f, chunks[1], view, stock.open, stock.high, stock.low, currency);

    let titles: Vec<Line> = DetailTab::all().iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .select(
            DetailTab::all()
                .iter()
                .position(|&t| t == view.tab)
                .unwrap_or(0),
        );
    f.render_widget(tabs, chunks[2]);

    render_detail_tab(f, chunks[3], view.tab, detail);
}

fn render_price_chart(
    f: &mut Frame,
    area: Rect,
    view: &StockDetailView,
    open: f64,
    high: f64,
    low: f64,
    currency: &str,
) {
    let range_line = TimeRange::all()
        .iter()
        .map(|r| {
            if *r == view.time_range {
                format!("[{}]", r.tag())
            } else {
                format!(" {} ", r.tag())
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    let title = format!(
        "{range_line}   Open: {}  High: {}  Low: {}",
        format_currency(open, currency),
        format_currency(high, currency),
        format_currency(low, currency)
    );
    let block = Block::default().borders(Borders::ALL).title(title);

    let Some(series) = view.price_series() else {
        let empty = Paragraph::new("No chart data for this range")
            .block(block)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    };

    let points: Vec<(f64, f64)> = series
        .iter()
        .enumerate()
        .map(|(i, &p)| (i as f64, p))
        .collect();
    let min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let trend = series.last().copied().unwrap_or(0.0) - series.first().copied().unwrap_or(0.0);

    let dataset = Dataset::default()
        .marker(Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(change_color(trend)))
        .data(&points);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(Axis::default().bounds([0.0, (points.len().max(2) - 1) as f64]))
        .y_axis(
            Axis::default()
                .bounds([min, max])
                .labels(vec![Line::from(format!("{min:.2}")), Line::from(format!("{max:.2}"))]),
        );
    f.render_widget(chart, area);
}

fn render_detail_tab(f: &mut Frame, area: Rect, tab: DetailTab, detail: &StockDetail) {
    let stock = &detail.profile;
    let block = Block::default().borders(Borders::ALL).title(tab.title());
    match tab {
        DetailTab::Overview => {
            let rows = detail
                .key_metrics
                .iter()
                .map(|m| Row::new(vec![Cell::from(m.label), Cell::from(m.value)]));
            let table = Table::new(rows, [Constraint::Percentage(50), Constraint::Percentage(50)])
                .block(block);
            f.render_widget(table, area);
        }
        DetailTab::Financials => {
            let header = Row::new(vec!["Metric", "Current", "Previous", "Change"]).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
            let rows = detail
                .income_statement
                .iter()
                .chain(detail.balance_sheet.iter())
                .map(|r| {
                    let change = r.change.unwrap_or("");
                    let color = if change.starts_with('-') { Color::Red } else { Color::Green };
                    Row::new(vec![
                        Cell::from(r.metric),
                        Cell::from(r.current),
                        Cell::from(r.previous),
                        Cell::from(change).style(Style::default().fg(color)),
                    ])
                });
            let table = Table::new(rows, [Constraint::Percentage(25); 4])
                .header(header)
                .block(block);
            f.render_widget(table, area);
        }
        DetailTab::News => {
            let items: Vec<ListItem> = detail
                .news
                .iter()
                .map(|n| {
                    ListItem::new(vec![
                        Line::from(n.title.as_str()),
                        Line::from(vec![
                            Span::styled(
                                format!("{} · {} · ", n.source, n.time),
                                Style::default().fg(Color::Gray),
                            ),
                            Span::styled(
                                n.sentiment.label(),
                                Style::default().fg(match n.sentiment {
                                    Sentiment::Positive => Color::Green,
                                    Sentiment::Negative => Color::Red,
                                }),
                            ),
                        ]),
                    ])
                })
                .collect();
            f.render_widget(List::new(items).block(block), area);
        }
        DetailTab::About => {
            let text = vec![
                Line::from(stock.about.as_str()),
                Line::from(""),
                Line::from(format!("Sector: {}", stock.sector)),
                Line::from(format!("Industry: {}", stock.industry)),
                Line::from(format!("Employees: {}", format_number(stock.employees as f64))),
                Line::from(format!("Headquarters: {}", stock.headquarters)),
                Line::from(format!("Founded: {}", stock.founded)),
                Line::from(format!(
                    "Volume: {}  Market Cap: {}",
                    format_number(stock.volume as f64),
                    format_number(stock.market_cap)
                )),
            ];
            f.render_widget(
                Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
                area,
            );
        }
    }
}

fn render_add_investment(f: &mut Frame, area: Rect, add: &AddInvestmentView, currency: &str) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(columns[0]);

    let focused = |is_focused: bool| {
        if is_focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        }
    };

    let tab = add.selector.tab();
    let titles: Vec<Line> = AssetTab::all().iter().map(|t| Line::from(t.title())).collect();
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Asset Type"))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .select(AssetTab::all().iter().position(|&t| t == tab).unwrap_or(0));
    f.render_widget(tabs, left[0]);

    let search = Paragraph::new(format!("{}_", add.selector.query())).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Search {tab}..."))
            .border_style(focused(add.focus == Focus::Search)),
    );
    f.render_widget(search, left[1]);

    let list_title = if add.selector.results().is_empty() {
        format!("Popular {}", tab.title())
    } else {
        "Search Results".to_string()
    };
    let selected_symbol = add.selected().map(|i| i.symbol.as_str());
    let items: Vec<ListItem> = add
        .visible_instruments()
        .iter()
        .enumerate()
        .map(|(i, instrument)| {
            let mut style = if i == add.cursor {
                Style::default().bg(Color::DarkGray)
            } else {
                Style::default()
            };
            if selected_symbol == Some(instrument.symbol.as_str()) {
                style = style.add_modifier(Modifier::BOLD).fg(Color::Cyan);
            }
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:<6} {:<32}", instrument.symbol, instrument.name), style),
                Span::raw(format!("{} ", format_currency(instrument.price, currency))),
                Span::styled(
                    format_percent(instrument.change_percent),
                    Style::default().fg(change_color(instrument.change)),
                ),
            ]))
        })
        .collect();
    f.render_widget(
        List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .title(list_title)
                .border_style(focused(add.focus == Focus::Assets)),
        ),
        left[2],
    );

    let Some(instrument) = add.selected() else {
        render_message(
            f,
            columns[1],
            "Add Investment",
            "Select an asset from the left to continue",
            Color::Gray,
        );
        return;
    };

    let mut lines = vec![
        Line::styled(
            format!("Add {} ({})", instrument.name, instrument.symbol),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Line::from(vec![
            Span::raw(format!(
                "Current Price: {} ",
                format_currency(instrument.price, currency)
            )),
            Span::styled(
                format!(
                    "{} ({})",
                    format_currency(instrument.change, currency),
                    format_percent(instrument.change_percent)
                ),
                Style::default().fg(change_color(instrument.change)),
            ),
        ]),
        Line::from(""),
    ];
    for &field in FormField::all() {
        let is_focused = add.focus == Focus::Form(field);
        let label = if field == FormField::Shares && instrument.symbol == "BTC" {
            format!("{} (Units)", field.label())
        } else {
            field.label().to_string()
        };
        let cursor = if is_focused && field != FormField::TransactionType { "_" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("{label:<20}"), focused(is_focused)),
            Span::raw(format!("{}{cursor}", add.form.value(field))),
        ]));
    }
    let total = add.form.total_amount();
    lines.push(Line::from(""));
    lines.push(Line::styled(
        format!("Total Amount: {}", if total.is_empty() { "-" } else { total }),
        Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
    ));
    lines.push(Line::from(""));
    lines.push(Line::styled(
        "Enter on any field adds the investment",
        Style::default().fg(Color::Gray),
    ));

    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Order")),
        columns[1],
    );
}

fn render_message(f: &mut Frame, area: Rect, title: &str, message: &str, color: Color) {
    let paragraph = Paragraph::new(message)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .style(Style::default().fg(color))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn render_notification(f: &mut Frame, notification: &Notification) {
    let popup_area = centered_rect(60, 20, f.area());
    f.render_widget(Clear, popup_area);

    let (title, color) = match notification.kind {
        NotificationKind::Info => ("Notice", Color::Green),
        NotificationKind::Error => ("Error", Color::Red),
    };
    let paragraph = Paragraph::new(notification.message.as_str())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .style(Style::default().fg(color)),
        )
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, popup_area);
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
    use crate::order::fixed_clock;
    use crate::store::MemoryStore;

    fn test_app() -> App {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        App::new(
            "USD".to_string(),
            OrderBook::new(store),
            Timing {
                jitter_interval: Duration::from_secs(5),
                load_delay: Duration::from_millis(500),
            },
        )
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_view_from_str() {
        assert_eq!("dashboard".parse::<View>(), Ok(View::Dashboard));
        assert_eq!("Learning".parse::<View>(), Ok(View::Learning));
        assert_eq!("add".parse::<View>(), Ok(View::AddInvestment));
        assert_eq!("stock:tsla".parse::<View>(), Ok(View::StockDetail("TSLA".to_string())));
        assert!("stock:".parse::<View>().is_err());
        assert!("settings".parse::<View>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_on_running_dashboard() {
        let app = test_app();
        assert_eq!(app.view, View::Dashboard);
        let Screen::Dashboard(portfolio) = &app.screen else {
            panic!("expected dashboard");
        };
        assert!(portfolio.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dashboard_jitters_while_active() {
        let mut app = test_app();
        tokio::time::sleep(Duration::from_millis(5_100)).await;
        assert!(app.tick());
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_dashboard_stops_jitter() {
        let mut app = test_app();
        let Screen::Dashboard(portfolio) = &app.screen else {
            panic!("expected dashboard");
        };
        assert!(portfolio.is_running());

        app.handle_key(KeyCode::Char('2'));
        assert_eq!(app.view, View::Learning);
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert!(!app.tick());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_opens_stock_detail() {
        let mut app = test_app();
        app.handle_key(KeyCode::Char('j'));
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view, View::StockDetail("MSFT".to_string()));
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(app.tick());
        let Screen::StockDetail(detail) = &app.screen else {
            panic!("expected stock detail");
        };
        assert_eq!(
            detail.detail().map(|d| d.profile.name.as_str()),
            Some("Microsoft Corporation")
        );

        app.handle_key(KeyCode::Esc);
        assert_eq!(app.view, View::Dashboard);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stock_detail_loads_after_delay() {
        let mut app = test_app();
        app.navigate(View::StockDetail("AAPL".to_string()));
        assert!(!app.tick());
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(app.tick());
        let Screen::StockDetail(detail) = &app.screen else {
            panic!("expected stock detail");
        };
        assert!(detail.detail().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_investment_flow() {
        let clock = fixed_clock();
        let expected_id = clock.millis;
        let mut app = test_app().with_clock(clock);
        app.handle_key(KeyCode::Char('a'));
        assert_eq!(app.view, View::AddInvestment);

        type_str(&mut app, "apple");
        app.handle_key(KeyCode::Enter);
        type_str(&mut app, "4");
        let Screen::AddInvestment(add) = &app.screen else {
            panic!("expected add investment");
        };
        assert_eq!(add.form.total_amount(), "730.52");

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.view, View::Dashboard);
        assert_eq!(
            app.notification.as_ref().map(|n| n.message.as_str()),
            Some(SUCCESS_MESSAGE)
        );
        let orders = app.book.load();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].symbol, "AAPL");
        assert_eq!(orders[0].total_amount, 730.52);
        assert_eq!(orders[0].id, expected_id);
        assert_eq!(orders[0].date.to_string(), "2024-03-01");

        // first key only dismisses the popup
        app.handle_key(KeyCode::Char('q'));
        assert!(!app.should_quit);
        app.handle_key(KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_without_selection_shows_error() {
        let mut app = test_app();
        app.navigate(View::AddInvestment);
        app.submit_order();
        assert_eq!(app.view, View::AddInvestment);
        let notification = app.notification.clone().unwrap();
        assert_eq!(notification.kind, NotificationKind::Error);
        assert_eq!(notification.message, "Please select a stock first");
        assert!(app.book.load().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_learning_complete_course_notifies() {
        let mut app = test_app();
        app.navigate(View::Learning);
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Tab);
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Char('c'));
        assert_eq!(
            app.notification.as_ref().map(|n| n.message.as_str()),
            Some(crate::learning::COMPLETION_MESSAGE)
        );
    }
}
