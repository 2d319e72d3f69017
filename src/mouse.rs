use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::action::{TreeAction, TreeEvent};
use crate::model::TreeNode;
use crate::state::TreeViewState;

impl<N: TreeNode + 'static> TreeViewState<N> {
    /// Routes a crossterm mouse event: left clicks go through
    /// [`Self::handle_click`], the wheel scrolls one row at a time.
    pub fn handle_mouse(&mut self, event: MouseEvent) -> TreeEvent {
        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => self.handle_click(event.column, event.row),
            MouseEventKind::ScrollDown => self.handle_action(TreeAction::ScrollDown(1)),
            MouseEventKind::ScrollUp => self.handle_action(TreeAction::ScrollUp(1)),
            _ => TreeEvent::Unhandled,
        }
    }
}
