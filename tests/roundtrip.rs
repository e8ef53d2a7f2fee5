//! Round-trip fidelity tests over realistic build scripts
//!
//! Any document parsed and serialized without mutation must reproduce its
//! input byte-for-byte, whatever formatting the author used.

use cmakedoc::parse;

const REALISTIC: &str = r#"cmake_minimum_required(VERSION 2.8.3)
project(nav_grid)

# Boilerplate comment kept by the author
find_package(catkin REQUIRED COMPONENTS
    roscpp
    std_msgs
)

catkin_package(
    INCLUDE_DIRS include
    LIBRARIES ${PROJECT_NAME}
    CATKIN_DEPENDS roscpp std_msgs
)

include_directories(include ${catkin_INCLUDE_DIRS})

add_library(${PROJECT_NAME}
    src/nav_grid.cpp
    src/coordinate_conversion.cpp)
target_link_libraries(${PROJECT_NAME} ${catkin_LIBRARIES})

if(CATKIN_ENABLE_TESTING)
  catkin_add_gtest(utest test/utest.cpp)
  target_link_libraries(utest ${PROJECT_NAME})
endif()

install(TARGETS ${PROJECT_NAME}
        ARCHIVE DESTINATION ${CATKIN_PACKAGE_LIB_DESTINATION}
        LIBRARY DESTINATION ${CATKIN_PACKAGE_LIB_DESTINATION})
install(DIRECTORY include/${PROJECT_NAME}/
        DESTINATION ${CATKIN_PACKAGE_INCLUDE_DESTINATION})
"#;

#[test]
fn test_realistic_file_round_trips() {
    let doc = parse(REALISTIC).unwrap();
    assert_eq!(doc.to_string(), REALISTIC);
}

#[test]
fn test_realistic_file_structure() {
    let doc = parse(REALISTIC).unwrap();
    assert_eq!(doc.project_name(), Some("nav_grid"));
    assert_eq!(doc.commands("install").len(), 2);
    assert_eq!(doc.groups().len(), 1);
    assert_eq!(doc.libraries(), vec!["nav_grid"]);
    // Targets declared inside guarded blocks are not top-level targets
    assert_eq!(doc.ordered_build_targets(), vec!["${PROJECT_NAME}"]);
}

#[test]
fn test_no_command_is_dirty_after_parse() {
    let doc = parse(REALISTIC).unwrap();
    for name in ["project", "find_package", "catkin_package", "install"] {
        for command in doc.commands(name) {
            assert!(!command.is_dirty(), "{} should be clean", name);
        }
    }
}

#[test]
fn test_awkward_formatting_round_trips() {
    for source in [
        "",
        "\n",
        "   \n\t\n",
        "# only a comment\n",
        "# comment without newline",
        "foo()",
        "foo ( a  b\tc )\n",
        "foo(\"quoted (parens) inside\")\n",
        "if(a)\nelse_thing(b)\nendif()\nif(c)\nendif()\n",
        "foreach(x a b c)\n  message(${x})\nendforeach()\n",
        "set(FLAGS -Wall)\nadd_definitions(${FLAGS} # inline note\n)\n",
    ] {
        let doc = parse(source).unwrap();
        assert_eq!(doc.to_string(), source, "round trip failed for {:?}", source);
    }
}

#[test]
fn test_write_if_changed_skips_identical_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("CMakeLists.txt");

    let doc = parse(REALISTIC).unwrap();
    assert!(doc.write_if_changed(&path).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), REALISTIC);

    // Identical content: no second write
    assert!(!doc.write_if_changed(&path).unwrap());

    // Stale content gets replaced
    std::fs::write(&path, "something else\n").unwrap();
    assert!(doc.write_if_changed(&path).unwrap());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), REALISTIC);
}

#[test]
fn test_untouched_neighbors_survive_a_mutation() {
    let mut doc = parse(REALISTIC).unwrap();
    doc.section_check(&["geometry_msgs"], "find_package", "COMPONENTS", false, true);

    let out = doc.to_string();
    // The touched command was regenerated
    assert!(out.contains("geometry_msgs"));
    // Untouched commands replay their original text, odd formatting included
    assert!(out.contains("add_library(${PROJECT_NAME}\n    src/nav_grid.cpp\n    src/coordinate_conversion.cpp)"));
    assert!(out.contains("install(TARGETS ${PROJECT_NAME}\n        ARCHIVE"));
}
