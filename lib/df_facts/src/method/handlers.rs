//! Exception handlers of try blocks.

use super::MethodWriter;
use crate::relations::Relation;
use crate::repr;
use df_dex::code::TryBlock;
use df_dex::registers::Reg;
use df_dex::Addr;
use log::{error, warn};

const THROWABLE: &str = "java.lang.Throwable";

/// A `move-exception` seen while decoding, bound to its handler afterwards.
#[derive(Debug, Clone, Copy)]
pub(super) struct MoveException {
    pub(super) reg: Reg,
    pub(super) addr: Addr,
    pub(super) index: usize,
}

struct HandlerRegion {
    insn: String,
    addr: Addr,
    index: usize,
}

impl<'a> MethodWriter<'a> {
    /// Writes one handler fact per catch clause, each linked to the clause
    /// before it in its try block, then binds the caught exception to the
    /// register of the handler `move-exception`.
    pub(super) fn write_exception_handlers(&mut self, tries: &[TryBlock]) {
        let mut regions = Vec::new();

        for block in tries {
            let mut handlers: Vec<_> = block.handlers().iter().collect();
            handlers.sort_by_key(|handler| handler.addr());

            let start = self.addresses.index_of(block.start_addr());
            let end = self.addresses.index_of(block.end_addr());
            let mut previous: Option<String> = None;

            for handler in handlers {
                let exception_type = match handler.exception_type() {
                    Some(t) => t.to_java_string(),
                    None => {
                        warn!(
                            "{}: handler without exception type at address {}, caught as {THROWABLE}",
                            self.id(),
                            handler.addr()
                        );
                        THROWABLE.to_string()
                    }
                };

                let (Some(index), Some(start), Some(end)) =
                    (self.addresses.index_of(handler.addr()), start, end)
                else {
                    error!(
                        "{}: cannot map handler of {exception_type} at address {} \
                         (try block {}..{})",
                        self.id(),
                        handler.addr(),
                        block.start_addr(),
                        block.end_addr()
                    );
                    previous = None;
                    continue;
                };

                let insn = self.insn(&repr::handler_kind(&exception_type), index);
                self.add(
                    Relation::ExceptionHandler,
                    &[
                        &insn,
                        self.id(),
                        &index.to_string(),
                        &exception_type,
                        &start.to_string(),
                        &end.to_string(),
                    ],
                );
                if let Some(previous) = &previous {
                    self.add(Relation::ExceptionHandlerPrevious, &[&insn, previous]);
                }

                regions.push(HandlerRegion {
                    insn: insn.clone(),
                    addr: handler.addr(),
                    index,
                });
                previous = Some(insn);
            }
        }

        let moves = std::mem::take(&mut self.exception_moves);
        for mv in moves {
            let mut bound = false;
            for region in regions.iter().filter(|region| region.addr == mv.addr) {
                if region.index != mv.index {
                    warn!(
                        "{}: move-exception at index {} bound to handler at index {}",
                        self.id(),
                        mv.index,
                        region.index
                    );
                }
                let var = self.local(mv.reg);
                self.add(Relation::ExceptionHandlerFormalParam, &[&region.insn, &var]);
                bound = true;
            }
            if !bound {
                error!(
                    "{}: move-exception at index {} is not the start of any handler",
                    self.id(),
                    mv.index
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use crate::relations::Relation;

    const RUN: &str = "<a.Main: void run(long,int)>";

    fn code(tries: &str) -> String {
        format!(
            r#"{{
                "registers_size": 8,
                "instructions": [
                    {{"op": "invoke-static", "args": [[], 1]}},
                    {{"op": "return-void"}},
                    {{"op": "move-exception", "args": 0}},
                    {{"op": "return-void"}},
                    {{"op": "move-exception", "args": 1}},
                    {{"op": "throw", "args": 1}}
                ],
                "tries": {tries}
            }}"#
        )
    }

    #[test]
    fn chained_handlers() {
        // handlers are listed out of address order
        let code = code(
            r#"[{
                "start_addr": 0,
                "insn_count": 4,
                "handlers": [
                    {"exception_type": "Ljava/lang/RuntimeException;", "addr": 6},
                    {"exception_type": "Ljava/io/IOException;", "addr": 4}
                ]
            }]"#,
        );
        let (sink, result) = translate(&container(9, &code));
        result.unwrap();

        let io = format!("{RUN}/catch java.io.IOException/3");
        let runtime = format!("{RUN}/catch java.lang.RuntimeException/5");
        assert_eq!(
            sink.rows(Relation::ExceptionHandler),
            vec![
                row(&[&io, RUN, "3", "java.io.IOException", "1", "3"]),
                row(&[&runtime, RUN, "5", "java.lang.RuntimeException", "1", "3"]),
            ]
        );
        assert_eq!(
            sink.rows(Relation::ExceptionHandlerPrevious),
            vec![row(&[&runtime, &io])]
        );
        assert_eq!(
            sink.rows(Relation::ExceptionHandlerFormalParam),
            vec![
                row(&[&io, &format!("{RUN}/v0")]),
                row(&[&runtime, &format!("{RUN}/v1")]),
            ]
        );
    }

    #[test]
    fn catch_all_handler() {
        let code = code(r#"[{"start_addr": 0, "insn_count": 4, "handlers": [{"addr": 4}]}]"#);
        let (sink, result) = translate(&container(9, &code));
        result.unwrap();

        let all = format!("{RUN}/catch java.lang.Throwable/3");
        assert_eq!(
            sink.rows(Relation::ExceptionHandler),
            vec![row(&[&all, RUN, "3", "java.lang.Throwable", "1", "3"])]
        );
        assert_eq!(sink.count(Relation::ExceptionHandlerPrevious), 0);
        // the second move-exception has no handler
        assert_eq!(sink.count(Relation::ExceptionHandlerFormalParam), 1);
    }

    #[test]
    fn unmapped_handler_breaks_the_chain() {
        let code = r#"{
            "registers_size": 8,
            "instructions": [
                {"op": "move-exception", "args": 0},
                {"op": "const16", "args": [0, 1]},
                {"op": "move-exception", "args": 1},
                {"op": "return-void"}
            ],
            "tries": [{
                "start_addr": 4,
                "insn_count": 1,
                "handlers": [
                    {"exception_type": "Ljava/io/IOException;", "addr": 0},
                    {"exception_type": "Ljava/lang/RuntimeException;", "addr": 2},
                    {"exception_type": "Ljava/lang/Object;", "addr": 3}
                ]
            }]
        }"#;
        let (sink, result) = translate(&container(9, code));
        result.unwrap();
        // address 2 is inside the const16
        assert_eq!(
            sink.rows(Relation::ExceptionHandler),
            vec![
                row(&[&format!("{RUN}/catch java.io.IOException/1"), RUN, "1", "java.io.IOException", "4", "5"]),
                row(&[&format!("{RUN}/catch java.lang.Object/3"), RUN, "3", "java.lang.Object", "4", "5"]),
            ]
        );
        assert_eq!(sink.count(Relation::ExceptionHandlerPrevious), 0);
        assert_eq!(sink.count(Relation::ExceptionHandlerFormalParam), 2);
    }
}
