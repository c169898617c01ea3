//! Rolling daily volume caps for invest and redeem.
//!
//! The window resets lazily: the first touch at or after
//! `window_start + window_length` zeroes both counters and restarts the
//! window at `now`, and only then is the cap checked. [`RateLimitWindow::check`]
//! is pure and returns a [`WindowTicket`] holding the would-be state; the
//! ledger commits the ticket only once the rest of the operation can no
//! longer fail, so a rejected operation never leaves a half-applied reset.

use chrono::{DateTime, Duration, Utc};
use openrwa_types::{Amount, Result, RwaError, constants};

/// Which counter an operation draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Counted in payment-asset base units.
    Invest,
    /// Counted in value-unit base units.
    Redeem,
}

/// Window state an operation will leave behind if it completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a ticket does nothing until committed"]
pub struct WindowTicket {
    window_start: DateTime<Utc>,
    invested: Amount,
    redeemed: Amount,
}

/// Per-ledger invest/redeem volume window. A cap of 0 means unlimited.
#[derive(Debug, Clone)]
pub struct RateLimitWindow {
    window_start: DateTime<Utc>,
    window_length: Duration,
    invested: Amount,
    redeemed: Amount,
    invest_cap: Amount,
    redeem_cap: Amount,
}

impl RateLimitWindow {
    #[must_use]
    pub fn new(start: DateTime<Utc>, invest_cap: Amount, redeem_cap: Amount) -> Self {
        Self {
            window_start: start,
            window_length: Duration::seconds(constants::RATE_LIMIT_WINDOW_SECS),
            invested: 0,
            redeemed: 0,
            invest_cap,
            redeem_cap,
        }
    }

    /// Window state as seen at `now`, with the lazy reset applied.
    fn projected(&self, now: DateTime<Utc>) -> WindowTicket {
        if now >= self.window_start + self.window_length {
            WindowTicket {
                window_start: now,
                invested: 0,
                redeemed: 0,
            }
        } else {
            WindowTicket {
                window_start: self.window_start,
                invested: self.invested,
                redeemed: self.redeemed,
            }
        }
    }

    /// Validate drawing `amount` on `flow` at `now` without mutating.
    ///
    /// # Errors
    /// `InvestCapExceeded` / `RedeemCapExceeded` carrying the remaining
    /// capacity of the (possibly reset) window.
    pub fn check(&self, flow: Flow, amount: Amount, now: DateTime<Utc>) -> Result<WindowTicket> {
        let mut ticket = self.projected(now);
        let (used, cap) = match flow {
            Flow::Invest => (&mut ticket.invested, self.invest_cap),
            Flow::Redeem => (&mut ticket.redeemed, self.redeem_cap),
        };

        if cap == 0 {
            *used = used.saturating_add(amount);
            return Ok(ticket);
        }

        match used.checked_add(amount) {
            Some(next) if next <= cap => {
                *used = next;
                Ok(ticket)
            }
            _ => {
                let remaining = cap.saturating_sub(*used);
                Err(match flow {
                    Flow::Invest => RwaError::InvestCapExceeded { remaining },
                    Flow::Redeem => RwaError::RedeemCapExceeded { remaining },
                })
            }
        }
    }

    /// Apply a ticket produced by [`Self::check`].
    pub fn commit(&mut self, ticket: WindowTicket) {
        self.window_start = ticket.window_start;
        self.invested = ticket.invested;
        self.redeemed = ticket.redeemed;
    }

    /// Remaining capacity at `now`; `None` when the cap is unlimited.
    #[must_use]
    pub fn remaining(&self, flow: Flow, now: DateTime<Utc>) -> Option<Amount> {
        let view = self.projected(now);
        match flow {
            Flow::Invest => (self.invest_cap != 0)
                .then(|| self.invest_cap.saturating_sub(view.invested)),
            Flow::Redeem => (self.redeem_cap != 0)
                .then(|| self.redeem_cap.saturating_sub(view.redeemed)),
        }
    }

    pub fn set_cap(&mut self, flow: Flow, cap: Amount) -> Amount {
        match flow {
            Flow::Invest => std::mem::replace(&mut self.invest_cap, cap),
            Flow::Redeem => std::mem::replace(&mut self.redeem_cap, cap),
        }
    }

    #[must_use]
    pub fn cap(&self, flow: Flow) -> Amount {
        match flow {
            Flow::Invest => self.invest_cap,
            Flow::Redeem => self.redeem_cap,
        }
    }

    /// Stored (not projected) counters.
    #[must_use]
    pub fn used(&self, flow: Flow) -> Amount {
        match flow {
            Flow::Invest => self.invested,
            Flow::Redeem => self.redeemed,
        }
    }

    #[must_use]
    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }
}
