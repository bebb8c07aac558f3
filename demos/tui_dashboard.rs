use std::{io, sync::Arc, time::Duration};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};

use ledger_flow::format::{format_amount, format_ledger_date, truncate_address};
use ledger_flow::{ConnectionState, DashboardClient, DashboardSnapshot, FeedConfig, StoreHandle, TransactionEvent};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = DashboardClient::start(FeedConfig::from_env())?;
    let store = client.store();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Crossterm polling blocks, so the UI runs off the runtime threads.
    let res = tokio::task::block_in_place(|| run_ui_loop(&mut terminal, &store));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    client.shutdown().await;

    if let Err(err) = res {
        println!("{:?}", err)
    }
    Ok(())
}

fn run_ui_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, store: &StoreHandle) -> io::Result<()> {
    loop {
        let snapshot = store.current_snapshot();
        terminal.draw(|f| ui(f, &snapshot))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if let KeyCode::Char('q') = key.code {
                    return Ok(());
                }
            }
        }
    }
}

fn state_style(state: ConnectionState) -> Style {
    match state {
        ConnectionState::Connected => Style::default().fg(Color::Green),
        ConnectionState::Idle => Style::default().fg(Color::Yellow),
        ConnectionState::Connecting => Style::default().fg(Color::Cyan),
        ConnectionState::Disconnected | ConnectionState::Error => {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        }
    }
}

fn ui(f: &mut Frame, s: &Arc<DashboardSnapshot>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(7), Constraint::Min(1), Constraint::Length(3)])
        .split(f.area());

    let title = Paragraph::new("XRP LEDGER LIVE FLOW")
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    let stats_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let m = &s.metrics;
    let largest = m
        .largest_transaction
        .as_ref()
        .map(|l| format!("{:.2} XRP", l.amount))
        .unwrap_or_else(|| "-".to_string());
    let stats = vec![
        Line::from(format!("Transactions: {} ({} payments, {} offers)", m.total_transactions(), m.payment_count, m.offer_count)),
        Line::from(format!("Volume: {:.2} XRP (avg {:.2})", m.total_native_volume, s.average_payment_volume())),
        Line::from(format!("Largest: {}", largest)),
        Line::from(format!("Throughput: {:.2} tps (peak {:.2})", s.transactions_per_second(), m.peak_throughput)),
        Line::from(format!("Accounts: {}  Large payments: {}", s.unique_account_count(), m.large_payment_count)),
    ];
    f.render_widget(
        Paragraph::new(stats).block(Block::default().title(" Network ").borders(Borders::ALL)),
        stats_chunks[0],
    );

    let currencies: Vec<ListItem> = s
        .top_currencies(4)
        .into_iter()
        .map(|(currency, count)| ListItem::new(format!("{:<8} {}", currency, count)))
        .collect();
    f.render_widget(
        List::new(currencies).block(Block::default().title(" Currencies ").borders(Borders::ALL)),
        stats_chunks[1],
    );

    let feed_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[2]);

    let payment_rows: Vec<Row> = s.payments.iter().take(30).map(|tx| payment_row(tx)).collect();
    let payments = Table::new(payment_rows, [Constraint::Length(19), Constraint::Length(13), Constraint::Min(10)])
        .header(Row::new(vec!["Date", "From", "Amount"]).style(Style::default().add_modifier(Modifier::UNDERLINED)))
        .block(Block::default().title(" Payments ").borders(Borders::ALL));
    f.render_widget(payments, feed_chunks[0]);

    let offer_rows: Vec<Row> = s.offers.iter().take(30).map(|tx| offer_row(tx)).collect();
    let offers = Table::new(offer_rows, [Constraint::Length(13), Constraint::Percentage(50), Constraint::Percentage(50)])
        .header(Row::new(vec!["Account", "Pays", "Gets"]).style(Style::default().add_modifier(Modifier::UNDERLINED)))
        .block(Block::default().title(" Offers ").borders(Borders::ALL));
    f.render_widget(offers, feed_chunks[1]);

    let footer = Paragraph::new(format!("Status: {} | v{} | q to quit", s.connection, s.version))
        .style(state_style(s.connection.state))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[3]);
}

fn payment_row(tx: &TransactionEvent) -> Row<'static> {
    let amount = tx.amount.as_ref().map(format_amount).unwrap_or_default();
    Row::new(vec![
        Cell::from(format_ledger_date(tx.date)),
        Cell::from(truncate_address(tx.account.as_deref().unwrap_or_default())),
        Cell::from(amount).style(Style::default().fg(Color::Green)),
    ])
}

fn offer_row(tx: &TransactionEvent) -> Row<'static> {
    let pays = tx.taker_pays.as_ref().map(format_amount).unwrap_or_default();
    let gets = tx.taker_gets.as_ref().map(format_amount).unwrap_or_default();
    Row::new(vec![
        Cell::from(truncate_address(tx.account.as_deref().unwrap_or_default())),
        Cell::from(pays),
        Cell::from(gets),
    ])
}
