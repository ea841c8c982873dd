//! Per-trade metric computation (spec.md §4.6 step 3).
//!
//! Every function here is a pure function of a [`Trade`], a [`MarketSnapshot`]
//! and the underlying's current spot price — no I/O, no shared state — so the
//! supervisor can run them concurrently across trades without synchronization.

use chrono::{DateTime, Utc};
use reccore::market::MarketSnapshot;
use reccore::{ActiveTrade, Price, Trade, TradeSide};
use rust_decimal::Decimal;

/// Side-specific price the position would close at right now: selling into
/// the bid for the leg actually held.
pub fn current_close_price(trade: &Trade, market: &MarketSnapshot) -> Price {
    match trade.side {
        TradeSide::Yes => market.yes_bid,
        TradeSide::No => market.no_bid,
    }
}

/// Market-implied probability (0-100) of the leg actually held, taken as the
/// bid/ask midpoint. Falls back to the bid alone if the ask side is empty,
/// rather than reporting no probability at all.
pub fn current_probability(trade: &Trade, market: &MarketSnapshot) -> Decimal {
    let (bid, ask) = match trade.side {
        TradeSide::Yes => (market.yes_bid, market.yes_ask),
        TradeSide::No => (market.no_bid, market.no_ask),
    };
    if ask.is_positive() {
        (bid.inner() + ask.inner()) / Decimal::from(2)
    } else {
        bid.inner()
    }
}

/// Signed distance of the underlying's current spot price from the trade's
/// strike.
pub fn buffer_from_strike(trade: &Trade, spot: Price) -> Price {
    Price::new(spot.inner() - trade.strike.inner())
}

/// Seconds elapsed since the trade was created.
pub fn time_since_entry(trade: &Trade, now: DateTime<Utc>) -> i64 {
    (now - trade.created_at).num_seconds()
}

/// Mark-to-market P&L in dollars: contracts are priced in cents, so the
/// per-contract cent delta is divided by 100 before scaling by position size.
pub fn current_pnl(trade: &Trade, close_price: Price) -> Price {
    let cents_per_contract = close_price.inner() - trade.buy_price.inner();
    let contracts = Decimal::from(trade.position);
    Price::new(cents_per_contract * contracts / Decimal::from(100) - trade.fees.inner())
}

/// Compute the full [`ActiveTrade`] row for one trade at one tick.
pub fn compute_active_trade(
    trade: &Trade,
    market: &MarketSnapshot,
    spot: Price,
    now: DateTime<Utc>,
) -> ActiveTrade {
    let close_price = current_close_price(trade, market);
    ActiveTrade {
        trade_id: trade.id,
        current_symbol_price: spot,
        current_close_price: close_price,
        buffer_from_strike: buffer_from_strike(trade, spot),
        time_since_entry: time_since_entry(trade, now),
        ttc_seconds: market.ttc_seconds(now),
        current_probability: current_probability(trade, market),
        current_pnl: current_pnl(trade, close_price),
        last_updated: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reccore::market::{EventTicker, MarketStatus};
    use reccore::{EntryMethod, Size, TicketId, TradeStatus};
    use rust_decimal_macros::dec;

    fn sample_market(yes_bid: Decimal, yes_ask: Decimal) -> MarketSnapshot {
        MarketSnapshot {
            ticker: EventTicker::new("KXBTCD-TEST"),
            strike: Price::new(dec!(107250)),
            yes_bid: Price::new(yes_bid),
            yes_ask: Price::new(yes_ask),
            no_bid: Price::new(Decimal::from(100) - yes_ask),
            no_ask: Price::new(Decimal::from(100) - yes_bid),
            yes_volume: Size::ZERO,
            no_volume: Size::ZERO,
            status: MarketStatus::Open,
            tier_spacing: Price::new(dec!(250)),
            close_time: Utc::now() + chrono::Duration::seconds(1800),
            open_time: Utc::now() - chrono::Duration::seconds(300),
            received_at: Utc::now(),
        }
    }

    fn sample_trade(side: TradeSide) -> Trade {
        let now = Utc::now();
        Trade {
            id: 7,
            ticket_id: TicketId::new(),
            symbol: "BTC".to_string(),
            contract: EventTicker::new("KXBTCD-TEST"),
            side,
            strike: Price::new(dec!(107250)),
            buy_price: Price::new(dec!(60)),
            position: 10,
            fees: Price::new(dec!(0.2)),
            prob: dec!(96),
            diff: dec!(0.3),
            momentum: dec!(0),
            symbol_open: Price::new(dec!(107100)),
            status: TradeStatus::Open,
            entry_method: EntryMethod::Auto,
            created_at: now - chrono::Duration::seconds(120),
            updated_at: now,
        }
    }

    #[test]
    fn test_current_close_price_picks_side() {
        let market = sample_market(dec!(60), dec!(62));
        let yes = sample_trade(TradeSide::Yes);
        let no = sample_trade(TradeSide::No);
        assert_eq!(current_close_price(&yes, &market), Price::new(dec!(60)));
        assert_eq!(current_close_price(&no, &market), Price::new(dec!(38)));
    }

    #[test]
    fn test_current_probability_is_midpoint() {
        let market = sample_market(dec!(60), dec!(62));
        let yes = sample_trade(TradeSide::Yes);
        assert_eq!(current_probability(&yes, &market), dec!(61));
    }

    #[test]
    fn test_buffer_from_strike_signed() {
        let trade = sample_trade(TradeSide::Yes);
        let buffer = buffer_from_strike(&trade, Price::new(dec!(107000)));
        assert_eq!(buffer, Price::new(dec!(-250)));
    }

    #[test]
    fn test_time_since_entry_positive() {
        let trade = sample_trade(TradeSide::Yes);
        assert!(time_since_entry(&trade, Utc::now()) >= 119);
    }

    #[test]
    fn test_current_pnl_profit_on_price_rise() {
        let trade = sample_trade(TradeSide::Yes);
        let pnl = current_pnl(&trade, Price::new(dec!(70)));
        // (70 - 60) * 10 / 100 - 0.2 = 1.0 - 0.2 = 0.8
        assert_eq!(pnl, Price::new(dec!(0.8)));
    }

    #[test]
    fn test_compute_active_trade_fields() {
        let market = sample_market(dec!(60), dec!(62));
        let trade = sample_trade(TradeSide::Yes);
        let now = Utc::now();
        let row = compute_active_trade(&trade, &market, Price::new(dec!(107300)), now);
        assert_eq!(row.trade_id, trade.id);
        assert_eq!(row.current_close_price, Price::new(dec!(60)));
        assert_eq!(row.current_probability, dec!(61));
    }
}
