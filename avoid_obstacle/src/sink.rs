use avoid_core::{AvoidResult, NodeInfo};
use avoid_library::nodes::CommandSink;
use avoid_library::CmdVel;
use std::io::Write;

/// Writes each command as one line of JSON
pub struct JsonLinesSink<W> {
    topic: String,
    out: W,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(topic: &str, out: W) -> Self {
        Self {
            topic: topic.to_string(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write + Send> CommandSink for JsonLinesSink<W> {
    fn send_command(&mut self, cmd: CmdVel, ctx: Option<&mut NodeInfo>) -> AvoidResult<()> {
        serde_json::to_writer(&mut self.out, &cmd)?;
        writeln!(self.out)?;
        self.out.flush()?;

        if let Some(ctx) = ctx {
            ctx.log_pub(&self.topic, &cmd);
        }
        Ok(())
    }

    fn topic_name(&self) -> &str {
        &self.topic
    }
}
