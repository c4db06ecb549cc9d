use crate::config::AnalyzerKind;
use crate::engine::execution::Order;
use crate::metrics::timeseries::{
    calculate_returns, max_drawdown, max_drawdown_len, max_drawdown_money, EquityPoint,
};
use chrono::NaiveDate;
use indexmap::IndexMap;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

//trading days used to annualize daily statistics
const TRADING_DAYS: f64 = 252.0;

//a round trip built from filled orders: opened by a buy from flat,
//closed when sells bring the position back to zero
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub entry_date: NaiveDate,
    pub exit_date: Option<NaiveDate>,
    //shares bought over the life of the trade
    pub size: u32,
    //size-weighted average fill price of the buys
    pub entry_price: f64,
    //price of the last sell
    pub exit_price: Option<f64>,
    //price difference only
    pub pnl: f64,
    //pnl after commission on both sides
    pub pnl_net: f64,
    pub commission: f64,
    pub bars_held: usize,
}

impl Trade {
    pub fn is_closed(&self) -> bool {
        self.exit_date.is_some()
    }
}

//groups filled orders into round trips; a trade still open at the end is
//returned with no exit
pub fn round_trips(filled: &[Order]) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut open: Option<(Trade, u32, usize)> = None;

    for order in filled {
        let Some(exec) = order.executed else {
            continue;
        };

        if order.is_buy() {
            match open.as_mut() {
                Some((trade, held, _)) => {
                    let total = *held + exec.size;
                    trade.entry_price = (trade.entry_price * *held as f64 + exec.value) / total as f64;
                    trade.size += exec.size;
                    trade.commission += exec.commission;
                    *held = total;
                }
                None => {
                    open = Some((
                        Trade {
                            entry_date: exec.date,
                            exit_date: None,
                            size: exec.size,
                            entry_price: exec.price,
                            exit_price: None,
                            pnl: 0.0,
                            pnl_net: 0.0,
                            commission: exec.commission,
                            bars_held: 0,
                        },
                        exec.size,
                        exec.bar,
                    ));
                }
            }
            continue;
        }

        //sells without an open trade cannot happen with a long-only broker
        let Some((trade, held, entry_bar)) = open.as_mut() else {
            continue;
        };

        trade.pnl += (exec.price - trade.entry_price) * exec.size as f64;
        trade.commission += exec.commission;
        trade.exit_price = Some(exec.price);
        *held = held.saturating_sub(exec.size);

        if *held == 0 {
            trade.exit_date = Some(exec.date);
            trade.bars_held = exec.bar - *entry_bar;
            trade.pnl_net = trade.pnl - trade.commission;
            if let Some((trade, _, _)) = open.take() {
                trades.push(trade);
            }
        }
    }

    if let Some((mut trade, _, _)) = open {
        trade.pnl_net = trade.pnl - trade.commission;
        trades.push(trade);
    }

    trades
}

//statistics computed once a run has finished
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerResult {
    pub initial_cash: f64,
    pub final_value: f64,

    //returns
    pub total_return: f64,
    pub total_return_pct: f64,
    pub annual_return: f64,

    //drawdown
    pub max_drawdown: f64,
    pub max_drawdown_money: f64,
    pub max_drawdown_len: usize,

    pub sharpe_ratio: f64,

    //trades
    pub trades: Vec<Trade>,
    pub closed_trades: usize,
    pub open_trades: usize,
    pub won: usize,
    pub lost: usize,
    pub win_rate: f64,
    pub gross_pnl: f64,
    pub net_pnl: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl AnalyzerResult {
    //calculate analyzer statistics from the equity curve and filled orders
    pub fn from_backtest(equity_curve: &[EquityPoint], filled: &[Order], initial_cash: f64) -> Self {
        let final_value = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_cash);

        let total_return = final_value - initial_cash;
        let total_return_pct = if initial_cash > 0.0 {
            total_return / initial_cash
        } else {
            0.0
        };

        let annual_return = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) => {
                let years = (last.date - first.date).num_days() as f64 / 365.25;
                if years > 0.0 && initial_cash > 0.0 && final_value > 0.0 {
                    (final_value / initial_cash).powf(1.0 / years) - 1.0
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let returns = calculate_returns(equity_curve);
        let trades = round_trips(filled);
        let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();

        let won = closed.iter().filter(|t| t.pnl_net > 0.0).count();
        let lost = closed.iter().filter(|t| t.pnl_net < 0.0).count();
        let win_rate = if closed.is_empty() {
            0.0
        } else {
            won as f64 / closed.len() as f64
        };

        let gross_pnl = closed.iter().map(|t| t.pnl).sum();
        let net_pnl = closed.iter().map(|t| t.pnl_net).sum();
        let largest_win = closed.iter().map(|t| t.pnl_net).fold(0.0f64, f64::max);
        let largest_loss = closed.iter().map(|t| t.pnl_net).fold(0.0f64, f64::min);

        AnalyzerResult {
            initial_cash,
            final_value,
            total_return,
            total_return_pct,
            annual_return,
            max_drawdown: max_drawdown(equity_curve),
            max_drawdown_money: max_drawdown_money(equity_curve, initial_cash),
            max_drawdown_len: max_drawdown_len(equity_curve),
            sharpe_ratio: calculate_sharpe_ratio(&returns),
            closed_trades: closed.len(),
            open_trades: trades.len() - closed.len(),
            won,
            lost,
            win_rate,
            gross_pnl,
            net_pnl,
            largest_win,
            largest_loss,
            trades,
        }
    }

    //statistics of one analyzer, in a stable order
    pub fn analyzer(&self, kind: AnalyzerKind) -> IndexMap<&'static str, f64> {
        let mut stats = IndexMap::new();
        match kind {
            AnalyzerKind::Returns => {
                stats.insert("total_return", self.total_return);
                stats.insert("total_return_pct", self.total_return_pct * 100.0);
                stats.insert("annual_return_pct", self.annual_return * 100.0);
            }
            AnalyzerKind::DrawDown => {
                stats.insert("max_drawdown_pct", self.max_drawdown * 100.0);
                stats.insert("max_drawdown_money", self.max_drawdown_money);
                stats.insert("max_drawdown_len", self.max_drawdown_len as f64);
            }
            AnalyzerKind::SharpeRatio => {
                stats.insert("sharpe_ratio", self.sharpe_ratio);
            }
            AnalyzerKind::TradeAnalyzer => {
                stats.insert("total_closed", self.closed_trades as f64);
                stats.insert("total_open", self.open_trades as f64);
                stats.insert("won", self.won as f64);
                stats.insert("lost", self.lost as f64);
                stats.insert("win_rate_pct", self.win_rate * 100.0);
                stats.insert("gross_pnl", self.gross_pnl);
                stats.insert("net_pnl", self.net_pnl);
                stats.insert("largest_win", self.largest_win);
                stats.insert("largest_loss", self.largest_loss);
            }
        }
        stats
    }

    //analyzer name -> statistic name -> value, for the requested analyzers
    pub fn report(&self, kinds: &[AnalyzerKind]) -> IndexMap<&'static str, IndexMap<&'static str, f64>> {
        kinds
            .iter()
            .map(|kind| (kind.name(), self.analyzer(*kind)))
            .collect()
    }

    //prints the requested analyzers in a formatted table
    pub fn pretty_print_table(&self, kinds: &[AnalyzerKind]) {
        let mut table = Table::new();

        table.add_row(Row::new(vec![
            Cell::new("Analyzer"),
            Cell::new("Metric"),
            Cell::new("Value"),
        ]));

        for (analyzer, stats) in self.report(kinds) {
            for (metric, value) in stats {
                table.add_row(Row::new(vec![
                    Cell::new(analyzer),
                    Cell::new(metric),
                    Cell::new(&format!("{:.4}", value)),
                ]));
            }
        }

        table.printstd();
    }
}

fn calculate_sharpe_ratio(returns: &[f64]) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }

    let mean = returns.mean();
    let std_dev = returns.std_dev();

    if !std_dev.is_finite() || std_dev == 0.0 {
        return 0.0;
    }

    //annualize assuming daily returns and a zero risk-free rate
    (mean / std_dev) * TRADING_DAYS.sqrt()
}
