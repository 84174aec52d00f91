use std::fmt::{self, Write as _};
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that feeds the execution trace sink.
///
/// ```rust,ignore
/// tracing_subscriber::registry()
///     .with(tracing_subscriber::fmt::layer())
///     .with(profsession::trace::TraceLayer::new())
///     .init();
/// ```
#[derive(Debug)]
pub struct TraceLayer {
    _private: (),
}

impl TraceLayer {
    pub fn new() -> Self {
        super::mark_attached();
        TraceLayer { _private: () }
    }
}

impl Default for TraceLayer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct FieldsVisitor(String);

impl FieldsVisitor {
    fn separator(&mut self) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
    }
}

impl Visit for FieldsVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.separator();
        let _ = write!(self.0, "{}={:?}", field.name(), value);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.separator();
        let _ = write!(self.0, "{}={:?}", field.name(), value);
    }
}

impl<S> Layer<S> for TraceLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(&self, attrs: &Attributes<'_>, _id: &Id, _ctx: Context<'_, S>) {
        if !super::is_active() {
            return;
        }
        let mut fields = FieldsVisitor::default();
        attrs.record(&mut fields);
        let meta = attrs.metadata();
        super::write_record("span", meta.target(), meta.name(), &fields.0);
    }

    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        span_record("enter", id, &ctx);
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        span_record("exit", id, &ctx);
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        span_record("close", &id, &ctx);
    }

    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if !super::is_active() {
            return;
        }
        let mut fields = FieldsVisitor::default();
        event.record(&mut fields);
        let meta = event.metadata();
        super::write_record(meta.level().as_str(), meta.target(), meta.name(), &fields.0);
    }
}

fn span_record<S>(kind: &str, id: &Id, ctx: &Context<'_, S>)
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    if !super::is_active() {
        return;
    }
    if let Some(span) = ctx.span(id) {
        let meta = span.metadata();
        super::write_record(kind, meta.target(), meta.name(), "");
    }
}
