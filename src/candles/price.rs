use crate::models::{PricePoint, Side, TradeRecord, TradeView};

/// Price of a trade in quote units per base unit, or the reciprocal when `inverted`.
///
/// Returns `None` when the legs do not pair up (`out0`/`in1` for a buy,
/// `in0`/`out1` for a sell) or when the result is not a positive finite number.
pub fn trade_price(trade: &TradeRecord, inverted: bool) -> Option<f64> {
    let (in0, out0) = (trade.amount0_in(), trade.amount0_out());
    let (in1, out1) = (trade.amount1_in(), trade.amount1_out());

    let base_price = if out0 > 0.0 && in1 > 0.0 {
        in1 / out0
    } else if in0 > 0.0 && out1 > 0.0 {
        out1 / in0
    } else {
        return None;
    };

    if !base_price.is_finite() || base_price <= 0.0 {
        return None;
    }
    if !inverted {
        return Some(base_price);
    }
    Some(1.0 / base_price).filter(|p| p.is_finite())
}

/// BUY/SELL from the perspective of the displayed orientation.
pub fn trade_side(trade: &TradeRecord, inverted: bool) -> Side {
    let base_side = if trade.amount0_in() > 0.0 {
        Side::Sell
    } else if trade.amount0_out() > 0.0 {
        Side::Buy
    } else {
        return Side::Unknown;
    };
    match (base_side, inverted) {
        (Side::Sell, true) => Side::Buy,
        (Side::Buy, true) => Side::Sell,
        (side, _) => side,
    }
}

/// Price point for aggregation; `None` for trades with no derivable price.
pub fn price_point(trade: &TradeRecord, inverted: bool) -> Option<PricePoint> {
    Some(PricePoint {
        timestamp: trade.timestamp(),
        price: trade_price(trade, inverted)?,
        side: trade_side(trade, inverted),
    })
}

/// Trade feed row; malformed trades are still listed, just without a price.
pub fn trade_view(trade: &TradeRecord, inverted: bool) -> TradeView {
    let (base_amount, quote_amount) = if inverted {
        (trade.quote_volume(), trade.base_volume())
    } else {
        (trade.base_volume(), trade.quote_volume())
    };
    TradeView {
        timestamp: trade.timestamp(),
        price: trade_price(trade, inverted),
        side: trade_side(trade, inverted),
        base_amount,
        quote_amount,
        signer: trade.signer().map(str::to_string),
        tx_hash: trade.tx_hash().map(str::to_string),
    }
}
