use tracing::trace;

use crate::actor::reactor::{Reactor, Result};
use crate::sys::event::button;
use crate::sys::window_server::WindowId;

/// What a click on the bar landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Hit {
    Before,
    After,
    Tab(usize),
}

pub struct PointerEventHandler;

impl PointerEventHandler {
    pub fn handle_button_press(
        reactor: &mut Reactor,
        window: WindowId,
        x: i32,
        y: i32,
        button: u8,
    ) -> Result<()> {
        if window != reactor.server.frame() || y < 0 || y >= reactor.bar_height as i32 {
            return Ok(());
        }
        let hit = Self::hit_test(reactor, x);
        trace!(x, button, ?hit, "bar click");

        match (hit, button) {
            (_, button::SCROLL_UP) => reactor.rotate(-1),
            (_, button::SCROLL_DOWN) => reactor.rotate(1),
            (Some(Hit::Before), button::LEFT) => reactor.rotate(-1),
            (Some(Hit::After), button::LEFT) => reactor.rotate(1),
            (Some(Hit::Tab(index)), button::LEFT) => reactor.select(index),
            (Some(Hit::Tab(index)), button::MIDDLE) => {
                reactor.select(index)?;
                reactor.close_selected()
            }
            _ => Ok(()),
        }
    }

    fn hit_test(reactor: &Reactor, x: i32) -> Option<Hit> {
        let indicators = reactor.indicators;
        if indicators.left.is_some_and(|rect| rect.contains_x(x)) {
            return Some(Hit::Before);
        }
        if indicators.right.is_some_and(|rect| rect.contains_x(x)) {
            return Some(Hit::After);
        }
        let x = u32::try_from(x).ok()?;
        reactor
            .registry
            .iter()
            .position(|client| client.tab_end.is_some_and(|end| x < end))
            .map(Hit::Tab)
    }
}
