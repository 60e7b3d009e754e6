mod config_tests {
    use crate::{BindKind, BinderConfig, Directive, Lexeme, Result, Rule};
    use crate::{error::ParserError, ConfigParser};
    use pest::Parser; // needed for ConfigParser::parse

    fn parse_directives(src: &str) -> Result<Vec<Directive>> {
        let mut pairs = ConfigParser::parse(Rule::main_grammar, src).map_err(|e| {
            ParserError::Syntax {
                file: "test".to_string(),
                message: e.to_string(),
            }
        })?;
        let top = pairs.next().ok_or(ParserError::Io("no parse tree".into()))?;
        top.into_inner()
            .filter(|p| p.as_rule() != Rule::EOI)
            .map(Directive::from_parsed_rule)
            .collect()
    }

    #[test]
    fn every_directive_form() {
        let src = "
            # Binder configuration
            +bind classes
            -bind typedefs

            +module SMDS
            -module Interface
            -header OSD_Parallel.hxx
            -class SMESH_Gen::TAlgoStateError
            -enum SMDSAbs_GeometryType
            -function Foo
            -typedef SMESH_ComputeErrorPtr
            +template NCollection_Array1<gp_Pnt> as TColgp_Array1OfPnt in TColgp
        ";
        let directives = parse_directives(src).expect("parse full configuration");
        assert_eq!(directives.len(), 10);
        assert_eq!(
            directives[0],
            Directive::Bind {
                enable: true,
                kind: BindKind::Classes
            }
        );
        assert_eq!(
            directives[3],
            Directive::Module {
                include: false,
                name: "Interface".into()
            }
        );
        assert_eq!(directives[4], Directive::Header("OSD_Parallel.hxx".into()));
        assert_eq!(
            directives[6],
            Directive::Exclude {
                kind: BindKind::Enums,
                name: "SMDSAbs_GeometryType".into()
            }
        );
        assert!(matches!(&directives[9], Directive::Template(i) if i.alias() == "TColgp_Array1OfPnt"));
    }

    #[test]
    fn config_collects_instantiations_in_order() {
        let src = "
            +template NCollection_Sequence<int> as IntSeq
            +template NCollection_Array1<gp_Pnt> as PntArray in TColgp
        ";
        let config = BinderConfig::from_source(src, "config.txt").unwrap();
        let aliases: Vec<_> = config.instantiations().iter().map(|i| i.alias()).collect();
        assert_eq!(aliases, vec!["IntSeq", "PntArray"]);
    }

    #[test]
    fn unknown_keyword_is_a_syntax_error() {
        assert!(matches!(
            parse_directives("+include Foo\n"),
            Err(ParserError::Syntax { .. })
        ));
    }

    #[test]
    fn comments_and_blank_lines_only() {
        let directives = parse_directives("# nothing\n\n   \n# still nothing").unwrap();
        assert!(directives.is_empty());
    }
}
