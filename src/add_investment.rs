use crate::error::OrderError;
use crate::instrument::{AssetTab, Instrument};
use crate::order::{Clock, FormField, Order, OrderForm};
use crate::search::InstrumentSelector;
use crate::store::{KeyValueStore, OrderBook};

pub const SUCCESS_MESSAGE: &str = "Investment added successfully!";

/// Which part of the screen receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Search,
    Assets,
    Form(FormField),
}

/// The add-investment screen: instrument picker on the left, order form on
/// the right.
pub struct AddInvestmentView {
    pub selector: InstrumentSelector,
    pub form: OrderForm,
    pub focus: Focus,
    /// Highlighted row in the result list (while searching) or the asset
    /// grid.
    pub cursor: usize,
}

impl AddInvestmentView {
    pub fn new<C: Clock + ?Sized>(clock: &C) -> Self {
        AddInvestmentView {
            selector: InstrumentSelector::new(),
            form: OrderForm::new(clock),
            focus: Focus::Search,
            cursor: 0,
        }
    }

    pub fn selected(&self) -> Option<&Instrument> {
        self.selector.selected()
    }

    /// Rows the cursor moves over: search results while there are any,
    /// otherwise the active tab's full list.
    pub fn visible_instruments(&self) -> &[Instrument] {
        if self.selector.results().is_empty() {
            self.selector.current_assets()
        } else {
            self.selector.results()
        }
    }

    pub fn select(&mut self, instrument: Instrument) {
        self.form.instrument_changed(&instrument);
        self.selector.select(instrument);
        self.cursor = 0;
    }

    pub fn select_at_cursor(&mut self) {
        if let Some(instrument) = self.visible_instruments().get(self.cursor).cloned() {
            self.select(instrument);
            self.focus = Focus::Form(FormField::Shares);
        }
    }

    pub fn set_tab(&mut self, tab: AssetTab) {
        self.selector.set_tab(tab);
        self.cursor = 0;
    }

    pub fn next_tab(&mut self) {
        self.set_tab(self.selector.tab().next());
    }

    pub fn set_shares(&mut self, value: &str) {
        let selected = self.selector.selected().cloned();
        self.form.set_shares(value, selected.as_ref());
    }

    pub fn cursor_down(&mut self) {
        if self.cursor < self.visible_instruments().len().saturating_sub(1) {
            self.cursor += 1;
        }
    }

    pub fn cursor_up(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Cycles search → assets → form fields. Form fields are skipped until
    /// something is selected.
    pub fn next_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Search => Focus::Assets,
            Focus::Assets if self.selected().is_some() => Focus::Form(FormField::TransactionType),
            Focus::Assets => Focus::Search,
            Focus::Form(FormField::Date) => Focus::Search,
            Focus::Form(field) => Focus::Form(field.next()),
        };
    }

    pub fn type_char(&mut self, c: char) {
        match self.focus {
            Focus::Search => {
                self.selector.push_char(c);
                self.cursor = 0;
            }
            Focus::Assets => {}
            Focus::Form(FormField::TransactionType) => {
                if c == ' ' {
                    self.form.transaction_type = self.form.transaction_type.toggled();
                }
            }
            Focus::Form(field) => {
                let selected = self.selector.selected().cloned();
                self.form.push_char(field, c, selected.as_ref());
            }
        }
    }

    pub fn backspace(&mut self) {
        match self.focus {
            Focus::Search => {
                self.selector.pop_char();
                self.cursor = 0;
            }
            Focus::Assets | Focus::Form(FormField::TransactionType) => {}
            Focus::Form(field) => {
                let selected = self.selector.selected().cloned();
                self.form.pop_char(field, selected.as_ref());
            }
        }
    }

    pub fn submit<S: KeyValueStore, C: Clock + ?Sized>(
        &self,
        book: &OrderBook<S>,
        clock: &C,
    ) -> Result<Order, OrderError> {
        self.form.submit(self.selector.selected(), book, clock)
    }
}
