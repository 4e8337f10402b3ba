//
// Copyright (c) 2024 flamestore contributors
//
// This program and the accompanying materials are made
// available under the terms of the Eclipse Public License 2.0
// which is available at https://www.eclipse.org/legal/epl-2.0/
//
// SPDX-License-Identifier: EPL-2.0
//

mod commit;
pub use commit::*;

mod flamegraph;
pub use flamegraph::*;

mod hardware;
pub use hardware::*;
